//! Relevance traversal.
//!
//! Answers "which requirements matter for this source file?" by walking the
//! refinement graph upstream, breadth-first, from the requirements declared
//! in the file.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::instrument;

use crate::domain::{Index, NodeId};

/// A requirement relevant to a file, with its distance from the file.
///
/// Distance 0 means the file declares the requirement itself; distance `n`
/// means it is `n` refinement links upstream of such a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevantNode {
    /// Node id.
    pub id: String,
    /// Requirement tier.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node title.
    pub title: String,
    /// Declaring document.
    pub file: String,
    /// Hops from the file's own requirements.
    pub distance: usize,
}

/// Find the requirements relevant to `file_path`, up to `max_depth` links
/// upstream of the ones it declares.
///
/// The result is sorted by `(distance, id)`. Each node appears once, at the
/// smallest distance it can be reached. A file that declares no requirements
/// yields an empty result. Cycles in the link graph are harmless: a node is
/// expanded at most once.
#[must_use]
#[instrument(level = "debug", skip(index))]
pub fn find_relevant(index: &Index, file_path: &str, max_depth: usize) -> Vec<RelevantNode> {
    let mut visited: BTreeMap<&NodeId, usize> = BTreeMap::new();
    let mut frontier: Vec<&NodeId> = index.nodes_for_file(file_path).into_iter().collect();
    for &id in &frontier {
        visited.insert(id, 0);
    }

    for depth in 1..=max_depth {
        if frontier.is_empty() {
            break;
        }

        let mut next = Vec::new();
        for &id in &frontier {
            for link in index.outgoing_links(id) {
                if !visited.contains_key(&link.to) {
                    visited.insert(&link.to, depth);
                    next.push(&link.to);
                }
            }
        }
        frontier = next;
    }

    let mut reached: Vec<(&NodeId, usize)> = visited.into_iter().collect();
    reached.sort_by(|(a, a_distance), (b, b_distance)| {
        a_distance
            .cmp(b_distance)
            .then_with(|| a.as_str().cmp(b.as_str()))
    });

    let relevant: Vec<RelevantNode> = reached
        .into_iter()
        .filter_map(|(id, distance)| {
            let node = index.node(id)?;
            Some(RelevantNode {
                id: node.id.to_string(),
                node_type: node.node_type.to_string(),
                title: node.title.to_string(),
                file: node.file.clone(),
                distance,
            })
        })
        .collect();

    tracing::debug!(count = relevant.len(), "found relevant requirements");
    relevant
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::index::tests::index;

    fn scenario() -> Index {
        index(
            &[("BR-001", "docs/req.md"), ("SR-001", "src/api.py")],
            &[("SR-001", "BR-001")],
        )
    }

    fn summary(result: &[RelevantNode]) -> Vec<(&str, usize)> {
        result
            .iter()
            .map(|node| (node.id.as_str(), node.distance))
            .collect()
    }

    /// BR-001 <- SR-001 <- AR-001 <- CODE-001 (declared in src/lib.rs),
    /// plus SR-002 also declared in src/lib.rs.
    fn chain() -> Index {
        index(
            &[
                ("BR-001", "docs/business.md"),
                ("SR-001", "docs/system.md"),
                ("SR-002", "src/lib.rs"),
                ("AR-001", "docs/arch.md"),
                ("CODE-001", "src/lib.rs"),
            ],
            &[
                ("CODE-001", "AR-001"),
                ("AR-001", "SR-001"),
                ("SR-001", "BR-001"),
                ("SR-002", "BR-001"),
            ],
        )
    }

    #[test]
    fn follows_refinement_upstream() {
        let result = find_relevant(&scenario(), "src/api.py", 1);

        assert_eq!(summary(&result), [("SR-001", 0), ("BR-001", 1)]);
        assert_eq!(result[1].node_type, "business");
        assert_eq!(result[1].file, "docs/req.md");
    }

    #[test]
    fn depth_zero_returns_declared_requirements() {
        let result = find_relevant(&scenario(), "src/api.py", 0);
        assert_eq!(summary(&result), [("SR-001", 0)]);
    }

    #[test]
    fn unknown_file_yields_nothing() {
        assert!(find_relevant(&scenario(), "src/unknown.py", 3).is_empty());
    }

    #[test]
    fn links_are_not_followed_downstream() {
        let result = find_relevant(&scenario(), "docs/req.md", 5);
        assert_eq!(summary(&result), [("BR-001", 0)]);
    }

    #[test]
    fn shortest_distance_wins() {
        // BR-001 is 1 hop from SR-002 and 3 hops from CODE-001.
        let result = find_relevant(&chain(), "src/lib.rs", 5);

        assert_eq!(
            summary(&result),
            [
                ("CODE-001", 0),
                ("SR-002", 0),
                ("AR-001", 1),
                ("BR-001", 1),
                ("SR-001", 2),
            ]
        );
    }

    #[test_case(0, &[("CODE-001", 0), ("SR-002", 0)]; "depth 0")]
    #[test_case(1, &[("CODE-001", 0), ("SR-002", 0), ("AR-001", 1), ("BR-001", 1)]; "depth 1")]
    #[test_case(2, &[("CODE-001", 0), ("SR-002", 0), ("AR-001", 1), ("BR-001", 1), ("SR-001", 2)]; "depth 2")]
    fn depth_bounds_the_walk(depth: usize, expected: &[(&str, usize)]) {
        let result = find_relevant(&chain(), "src/lib.rs", depth);
        assert_eq!(summary(&result), expected);
    }

    #[test]
    fn deeper_walks_extend_shallower_ones() {
        let index = chain();
        for depth in 0..4 {
            let shallow = find_relevant(&index, "src/lib.rs", depth);
            let deep = find_relevant(&index, "src/lib.rs", depth + 1);

            for node in &shallow {
                assert!(deep.contains(node), "{} missing at depth {}", node.id, depth + 1);
            }
            assert!(deep.iter().all(|node| node.distance <= depth + 1));
            assert!(
                deep.iter()
                    .filter(|node| !shallow.contains(node))
                    .all(|node| node.distance == depth + 1)
            );
        }
    }

    #[test_case(&["BR-999", "BR-1000"], &["BR-1000", "BR-999"]; "past padding width")]
    #[test_case(&["BR-10", "BR-2"], &["BR-10", "BR-2"]; "mixed padding")]
    fn ties_break_on_id_text(parents: &[&str], expected: &[&str]) {
        let mut nodes = vec![("SR-001", "src/api.py")];
        nodes.extend(parents.iter().map(|&id| (id, "docs/req.md")));
        let links: Vec<_> = parents.iter().map(|&id| ("SR-001", id)).collect();
        let index = index(&nodes, &links);

        let result = find_relevant(&index, "src/api.py", 1);

        let ids: Vec<&str> = result[1..].iter().map(|node| node.id.as_str()).collect();
        assert_eq!(result[0].id, "SR-001");
        assert_eq!(ids, expected);
    }

    #[test]
    fn terminates_on_cycles_without_duplicates() {
        let index = index(
            &[
                ("SR-001", "src/api.py"),
                ("BR-001", "docs/req.md"),
                ("BR-002", "docs/req.md"),
            ],
            &[
                ("SR-001", "BR-001"),
                ("BR-001", "BR-002"),
                ("BR-002", "SR-001"),
                ("BR-002", "BR-001"),
            ],
        );

        let result = find_relevant(&index, "src/api.py", 100);

        assert_eq!(summary(&result), [("SR-001", 0), ("BR-001", 1), ("BR-002", 2)]);
    }

    #[test]
    fn diamond_is_reported_once() {
        let index = index(
            &[
                ("BR-001", "docs/req.md"),
                ("SR-001", "docs/sys.md"),
                ("SR-002", "docs/sys.md"),
                ("AR-001", "src/main.rs"),
            ],
            &[
                ("AR-001", "SR-001"),
                ("AR-001", "SR-002"),
                ("SR-001", "BR-001"),
                ("SR-002", "BR-001"),
            ],
        );

        let result = find_relevant(&index, "src/main.rs", 2);

        assert_eq!(
            summary(&result),
            [("AR-001", 0), ("SR-001", 1), ("SR-002", 1), ("BR-001", 2)]
        );
    }

    #[test]
    fn serializes_type_field() {
        let result = find_relevant(&scenario(), "src/api.py", 0);
        let json = serde_json::to_value(&result[0]).unwrap();

        assert_eq!(json["type"], "system");
        assert_eq!(json["distance"], 0);
        assert!(json.get("node_type").is_none());
    }
}
