//! Offline demo: a prebuilt high-throughput-screening tree plus a scripted
//! oracle, so the whole loop works without an API key.

use std::sync::Arc;
use std::time::Duration;

use labtree::inventory::in_inventory;
use labtree::{CandidateNode, EquipmentNode, MockOracle, NodeKind};

fn node(name: &str, kind: NodeKind, description: &str) -> EquipmentNode {
    EquipmentNode::new(name, kind, description).with_inventory(in_inventory(name))
}

fn leaf(name: &str, kind: NodeKind, description: &str) -> Arc<EquipmentNode> {
    Arc::new(node(name, kind, description))
}

/// A condensed screening workcell: some branches populated, some left
/// unexpanded so `expand` has something to do.
pub fn demo_tree() -> Arc<EquipmentNode> {
    let liquid_handler = Arc::new(
        node("Liquid Handler", NodeKind::Required, "automated pipetting for assay setup")
            .with_spec("throughput", "8 plates/hour")
            .with_children(vec![
                leaf("Pipetting Head", NodeKind::Required, "96-channel head"),
                leaf("Tip Washer", NodeKind::Compatible, "reduces consumable cost"),
            ]),
    );
    let robotic_arm = Arc::new(
        node("Robotic Arm", NodeKind::Required, "moves plates between stations").with_children(
            vec![leaf("Plate Gripper", NodeKind::Required, "landscape/portrait regrip")],
        ),
    );
    Arc::new(
        node("HTS Workcell", NodeKind::Root, "high-throughput screening workcell").with_children(
            vec![
                liquid_handler,
                robotic_arm,
                leaf("Plate Reader", NodeKind::Compatible, "absorbance and fluorescence"),
                leaf("Plate Sealer", NodeKind::Compatible, "heat sealing before storage"),
                leaf("Incubator", NodeKind::Compatible, "37C / 5% CO2 holding"),
                leaf("Scheduling Software", NodeKind::Compatible, "workcell orchestration"),
            ],
        ),
    )
}

/// Scripted oracle for the demo tree's unexpanded leaves. The latency makes
/// the `(generating...)` affordance visible in `show`.
pub fn demo_oracle() -> MockOracle {
    MockOracle::new()
        .with_latency(Duration::from_millis(600))
        .with_initial(
            CandidateNode::new("HTS Lab", NodeKind::Root, "screening lab from a prompt")
                .with_children(vec![
                    CandidateNode::new("Liquid Handler", NodeKind::Required, "assay setup"),
                    CandidateNode::new("Plate Reader", NodeKind::Compatible, "readout"),
                ]),
        )
        .with_children_for(
            "Plate Reader",
            vec![
                CandidateNode::new("Injector Module", NodeKind::Compatible, "kinetic assays"),
                CandidateNode::new("Stacker", NodeKind::Compatible, "walk-away batches"),
            ],
        )
        .with_children_for(
            "Liquid Handler",
            vec![CandidateNode::new("Pipetting Head", NodeKind::Required, "96-channel head")],
        )
        .with_children_for(
            "Scheduling Software",
            vec![CandidateNode::new(
                "Integration Licenses",
                NodeKind::Compatible,
                "driver seats per instrument",
            )],
        )
        .with_urs(
            "# User Requirements Specification\n\n\
             ## 1. Introduction\nDemo document generated offline.\n\n\
             ## 2. System Overview\nHigh-throughput screening workcell.\n",
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: the demo tree has expandable leaves, stocked items, and
    /// exactly one root.
    #[test]
    fn demo_tree_shape() {
        let root = demo_tree();
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.children.len(), 6);
        assert!(root.children.iter().any(|c| c.is_unexpanded()));
        assert!(root.children.iter().any(|c| c.in_inventory));
        let names = labtree::store::collect_names(&root);
        assert!(names.contains(&"Tip Washer".to_string()));
    }

    /// **Scenario**: the scripted oracle expands the demo tree's Plate Reader.
    #[tokio::test]
    async fn demo_oracle_scripts_plate_reader() {
        let oracle = demo_oracle();
        let reader = EquipmentNode::new("Plate Reader", NodeKind::Compatible, "");
        let children = labtree::ExpansionOracle::expand_children(&oracle, &reader, &[])
            .await
            .unwrap();
        assert_eq!(children.len(), 2);
    }
}
