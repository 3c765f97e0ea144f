//! Interactive loop: read a line, dispatch a command, print, repeat until
//! EOF or `quit`.
//!
//! Free text is treated as a problem description and starts a fresh
//! analysis, like typing into the original search box. `expand` spawns the
//! chain on a background task so the prompt stays responsive; `show` during
//! that window renders the `(generating...)` latch.

use std::io::Write;
use std::sync::Arc;

use labtree::{store, EquipmentNode, ExpansionEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

pub async fn run(
    engine: Arc<ExpansionEngine>,
    problem: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("labtree — type `help` for commands.");
    if let Some(problem) = problem {
        analyze(&engine, &problem).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (cmd, rest) = split_command(line);
        match cmd {
            "quit" | "exit" | "/quit" => break,
            "help" => print_help(),
            "analyze" => {
                if rest.is_empty() {
                    eprintln!("usage: analyze <problem description>");
                } else {
                    analyze(&engine, rest).await;
                }
            }
            "expand" => expand(&engine, rest),
            "show" => show(&engine),
            "json" => dump_json(&engine),
            "names" => names(&engine),
            "report" => report(&engine).await,
            "reset" => {
                engine.reset();
                println!("tree cleared");
            }
            _ => analyze(&engine, line).await,
        }
    }
    println!("Bye.");
    Ok(())
}

fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    }
}

fn print_help() {
    println!(
        "commands:\n  \
         analyze <problem>   start over with a new problem description\n  \
         expand <id-prefix>  expand a node (background; `show` to watch)\n  \
         show                render the current tree\n  \
         json                dump the current tree as JSON\n  \
         names               list every equipment name in the tree\n  \
         report              generate the URS document\n  \
         reset               drop the current tree\n  \
         quit                exit\n\
         anything else is treated as a problem description"
    );
}

async fn analyze(engine: &Arc<ExpansionEngine>, problem: &str) {
    println!("analyzing...");
    match engine.initial_expand(problem).await {
        Ok(chain) => {
            println!(
                "auto-expanded {} required node(s){}",
                chain.expanded,
                if chain.failed > 0 {
                    format!(", {} failed (expandable again)", chain.failed)
                } else {
                    String::new()
                }
            );
            show(engine);
        }
        Err(e) => eprintln!("analysis failed: {e}"),
    }
}

/// Resolves the prefix against the current snapshot and spawns the chain.
/// Guard conditions (busy, populated, vanished) are handled inside the
/// engine; a stale prefix is the only user-facing error here.
fn expand(engine: &Arc<ExpansionEngine>, prefix: &str) {
    if prefix.is_empty() {
        eprintln!("usage: expand <id-prefix>");
        return;
    }
    let Some(root) = engine.snapshot() else {
        eprintln!("no tree yet; `analyze` first");
        return;
    };
    match resolve_prefix(&root, prefix) {
        Ok(id) => {
            let engine = Arc::clone(engine);
            tokio::spawn(async move {
                let chain = engine.on_node_clicked(&id).await;
                debug!(node_id = %id, ?chain, "click chain finished");
                if chain.failed > 0 {
                    eprintln!(
                        "expansion of {} failed; expand it again to retry",
                        render::short_id(&id)
                    );
                }
            });
            println!("expanding in the background; `show` to watch");
        }
        Err(e) => eprintln!("{e}"),
    }
}

fn show(engine: &Arc<ExpansionEngine>) {
    match engine.snapshot() {
        Some(root) => print!("{}", render::render(&root)),
        None => println!("(no tree)"),
    }
}

fn dump_json(engine: &Arc<ExpansionEngine>) {
    let Some(root) = engine.snapshot() else {
        println!("(no tree)");
        return;
    };
    match serde_json::to_string_pretty(&*root) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("serialize failed: {e}"),
    }
}

fn names(engine: &Arc<ExpansionEngine>) {
    let Some(root) = engine.snapshot() else {
        println!("(no tree)");
        return;
    };
    let mut names = store::collect_names(&root);
    names.sort();
    for name in names {
        println!("{name}");
    }
}

async fn report(engine: &Arc<ExpansionEngine>) {
    match engine.generate_report().await {
        Ok(doc) => println!("{doc}"),
        Err(e) => eprintln!("report failed: {e}"),
    }
}

/// Unique-prefix id lookup over the whole snapshot. Ambiguous or unknown
/// prefixes name the problem instead of guessing.
fn resolve_prefix(root: &Arc<EquipmentNode>, prefix: &str) -> Result<String, String> {
    let mut matches = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.id.starts_with(prefix) {
            matches.push(node);
        }
        stack.extend(node.children.iter());
    }
    match matches.as_slice() {
        [] => Err(format!("no node with id prefix `{prefix}`; see `show`")),
        [node] => Ok(node.id.clone()),
        many => Err(format!(
            "id prefix `{prefix}` is ambiguous ({} matches: {})",
            many.len(),
            many.iter()
                .map(|n| n.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labtree::NodeKind;

    fn tree() -> Arc<EquipmentNode> {
        let mut gripper = EquipmentNode::new("Gripper", NodeKind::Compatible, "");
        gripper.id = "aa11-gripper".to_string();
        let mut robot = EquipmentNode::new("Robot", NodeKind::Required, "");
        robot.id = "aa22-robot".to_string();
        let robot = robot.with_children(vec![Arc::new(gripper)]);
        let mut root = EquipmentNode::new("Workcell", NodeKind::Root, "");
        root.id = "bb33-root".to_string();
        Arc::new(root.with_children(vec![Arc::new(robot)]))
    }

    #[test]
    fn split_command_separates_first_token() {
        assert_eq!(split_command("expand aa11"), ("expand", "aa11"));
        assert_eq!(split_command("show"), ("show", ""));
        assert_eq!(
            split_command("analyze automate a cell culture lab"),
            ("analyze", "automate a cell culture lab")
        );
    }

    /// **Scenario**: unique prefix resolves; shared prefix reports ambiguity;
    /// unknown prefix reports absence.
    #[test]
    fn resolve_prefix_handles_all_cases() {
        let root = tree();
        assert_eq!(resolve_prefix(&root, "bb33").unwrap(), "bb33-root");
        assert_eq!(resolve_prefix(&root, "aa11").unwrap(), "aa11-gripper");

        let ambiguous = resolve_prefix(&root, "aa").unwrap_err();
        assert!(ambiguous.contains("ambiguous"));
        assert!(ambiguous.contains("Gripper"));

        assert!(resolve_prefix(&root, "zz").unwrap_err().contains("no node"));
    }
}
