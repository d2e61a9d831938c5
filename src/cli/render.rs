//! Output rendering.
//!
//! Every command builds its result first and hands it to a [`Renderer`],
//! chosen once from `--format`. Renderers return the text to print, so the
//! commands and the tests never depend on where output goes.

use std::{collections::BTreeMap, fmt::Write as _, path::Path};

use contextgit::{
    Link, Node, NodeId, RelevantNode, SyncReport, SyncStatus,
    domain::{LinkChange, SyncLabels},
};
use serde_json::{Value, json};

use super::terminal::{Tone, is_narrow, paint, sync_status};

/// Output format, selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Human-readable text
    #[default]
    Text,
    /// JSON documents
    Json,
}

impl Format {
    /// Build the renderer for this format.
    pub fn renderer(self, labels: SyncLabels) -> Box<dyn Renderer> {
        match self {
            Self::Text => Box::new(TextRenderer { labels }),
            Self::Json => Box::new(JsonRenderer { labels }),
        }
    }
}

/// A node together with the links touching it.
pub struct NodeDetail<'a> {
    pub node: &'a Node,
    pub outgoing: Vec<&'a Link>,
    pub incoming: Vec<&'a Link>,
}

/// Repository totals reported by `status`.
#[derive(Debug, Default)]
pub struct Summary {
    pub types: BTreeMap<String, usize>,
    pub links: BTreeMap<SyncStatus, usize>,
    pub cycles: Vec<Vec<NodeId>>,
}

/// Turns command results into printable output.
pub trait Renderer {
    fn initialised(&self, root: &Path) -> String;
    fn added(&self, node: &Node) -> String;
    fn linked(&self, link: &Link, created: bool) -> String;
    fn unlinked(&self, from: &NodeId, to: &NodeId, removed: usize) -> String;
    fn next_id(&self, id: &NodeId) -> String;
    fn node(&self, detail: &NodeDetail<'_>) -> String;
    fn extracted(&self, node: &Node, content: &str) -> String;
    fn relevant(&self, file: &str, nodes: &[RelevantNode]) -> String;
    fn checked(&self, report: &SyncReport, saved: bool) -> String;
    fn confirmed(&self, node: &Node, reset: usize) -> String;
    fn summary(&self, summary: &Summary) -> String;
}

pub struct TextRenderer {
    labels: SyncLabels,
}

impl TextRenderer {
    fn status(&self, status: SyncStatus) -> String {
        sync_status(status, &self.labels)
    }

    fn link_line(&self, link: &Link) -> String {
        format!(
            "{} --{}--> {} [{}]",
            link.from,
            link.relation_type,
            link.to,
            self.status(link.sync_status)
        )
    }
}

impl Renderer for TextRenderer {
    fn initialised(&self, root: &Path) -> String {
        format!(
            "{}\n  Created: .contextgit/config.yaml\n  Created: .contextgit/requirements_index.yaml",
            paint(
                format!("✅ Initialised contextgit repository in {}", root.display()),
                Tone::Good,
            )
        )
    }

    fn added(&self, node: &Node) -> String {
        format!("{} {}", paint(format!("✅ Added {}", node.id), Tone::Good), node.title)
    }

    fn linked(&self, link: &Link, created: bool) -> String {
        if created {
            format!("{} {}", paint("✅ Linked", Tone::Good), self.link_line(link))
        } else {
            format!("{} {}", paint("Already linked:", Tone::Quiet), self.link_line(link))
        }
    }

    fn unlinked(&self, from: &NodeId, to: &NodeId, removed: usize) -> String {
        let noun = if removed == 1 { "link" } else { "links" };
        paint(
            format!("✅ Removed {removed} {noun} from {from} to {to}"),
            Tone::Good,
        )
    }

    fn next_id(&self, id: &NodeId) -> String {
        id.to_string()
    }

    fn node(&self, detail: &NodeDetail<'_>) -> String {
        let node = detail.node;
        let mut out = format!("{} {}\n", paint(&node.id, Tone::Key), node.title);
        let location = if node.location.is_empty() {
            paint("(whole file)", Tone::Quiet)
        } else {
            node.location.join(" > ")
        };
        let _ = writeln!(out, "  {} {}", paint("Type:    ", Tone::Quiet), node.node_type);
        let _ = writeln!(out, "  {} {}", paint("Status:  ", Tone::Quiet), node.status);
        let _ = writeln!(out, "  {} {}", paint("File:    ", Tone::Quiet), node.file);
        let _ = writeln!(out, "  {} {location}", paint("Location:", Tone::Quiet));
        let _ = writeln!(out, "  {} {}", paint("Checksum:", Tone::Quiet), node.checksum);

        for (heading, links) in [("Outgoing", &detail.outgoing), ("Incoming", &detail.incoming)] {
            if links.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{heading}:");
            for link in links {
                let _ = writeln!(out, "  {}", self.link_line(link));
            }
        }

        out.trim_end().to_string()
    }

    fn extracted(&self, _node: &Node, content: &str) -> String {
        content.to_string()
    }

    fn relevant(&self, file: &str, nodes: &[RelevantNode]) -> String {
        if nodes.is_empty() {
            return paint(format!("No requirements are relevant to {file}."), Tone::Quiet);
        }

        let narrow = is_narrow();
        let mut out = format!("Requirements relevant to {file}:\n");
        for node in nodes {
            let indent = "  ".repeat(node.distance + 1);
            let _ = write!(out, "{indent}{} {}", paint(&node.id, Tone::Key), node.title);
            if !narrow {
                let _ = write!(out, " {}", paint(format!("({}, {})", node.node_type, node.file), Tone::Quiet));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }

    fn checked(&self, report: &SyncReport, saved: bool) -> String {
        let mut out = String::new();
        for change in report.changes() {
            let LinkChange {
                from,
                to,
                previous,
                current,
            } = change;
            let _ = writeln!(
                out,
                "  {from} → {to}: {} → {}",
                self.status(*previous),
                self.status(*current)
            );
        }

        let summary = format!(
            "{} links: {} {}, {} {}, {} {}",
            report.links.len(),
            report.count(SyncStatus::Ok),
            self.labels.ok,
            report.count(SyncStatus::Stale),
            self.labels.stale,
            report.count(SyncStatus::Broken),
            self.labels.broken,
        );
        let summary = if report.is_clean() {
            paint(format!("✅ {summary}"), Tone::Good)
        } else {
            paint(format!("⚠️  {summary}"), Tone::Caution)
        };
        out.push_str(&summary);
        if !saved {
            let _ = write!(out, "\n{}", paint("(dry run, index not updated)", Tone::Quiet));
        }
        out
    }

    fn confirmed(&self, node: &Node, reset: usize) -> String {
        paint(
            format!(
                "✅ Confirmed {} ({reset} incoming links marked {})",
                node.id, self.labels.ok
            ),
            Tone::Good,
        )
    }

    fn summary(&self, summary: &Summary) -> String {
        let total: usize = summary.types.values().sum();
        if total == 0 {
            return "No requirements found yet. Create one with 'contextgit add'.".to_string();
        }

        let mut out = String::from("Requirements:\n");
        for (node_type, count) in &summary.types {
            let _ = writeln!(out, "  {node_type:<14} {count:>4}");
        }
        let _ = writeln!(out, "  {:<14} {total:>4}", paint("total", Tone::Quiet));

        out.push_str("\nLinks:\n");
        for status in SyncStatus::ALL {
            let count = summary.links.get(&status).copied().unwrap_or_default();
            let _ = writeln!(out, "  {:<14} {count:>4}", self.status(status));
        }

        if summary.cycles.is_empty() {
            out.push_str(&paint("\nNo cycles", Tone::Good));
        } else {
            let _ = write!(out, "\n{}", paint(format!("{} cycles:", summary.cycles.len()), Tone::Caution));
            for cycle in &summary.cycles {
                let members: Vec<_> = cycle.iter().map(ToString::to_string).collect();
                let _ = write!(out, "\n  {}", members.join(", "));
            }
        }
        out
    }
}

pub struct JsonRenderer {
    labels: SyncLabels,
}

impl JsonRenderer {
    fn link(&self, link: &Link) -> Value {
        json!({
            "from": link.from.as_str(),
            "to": link.to.as_str(),
            "relation_type": link.relation_type.as_str(),
            "sync_status": self.labels.label(link.sync_status),
        })
    }

    fn node_value(node: &Node) -> Value {
        json!({
            "id": node.id.as_str(),
            "type": node.node_type.as_str(),
            "title": node.title.as_str(),
            "file": node.file,
            "location": node.location,
            "status": node.status.as_str(),
            "checksum": node.checksum,
        })
    }

    fn print(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

impl Renderer for JsonRenderer {
    fn initialised(&self, root: &Path) -> String {
        Self::print(&json!({ "initialised": root.display().to_string() }))
    }

    fn added(&self, node: &Node) -> String {
        Self::print(&Self::node_value(node))
    }

    fn linked(&self, link: &Link, created: bool) -> String {
        let mut value = self.link(link);
        value["created"] = created.into();
        Self::print(&value)
    }

    fn unlinked(&self, from: &NodeId, to: &NodeId, removed: usize) -> String {
        Self::print(&json!({
            "from": from.as_str(),
            "to": to.as_str(),
            "removed": removed,
        }))
    }

    fn next_id(&self, id: &NodeId) -> String {
        Self::print(&json!({ "id": id.as_str() }))
    }

    fn node(&self, detail: &NodeDetail<'_>) -> String {
        let mut value = Self::node_value(detail.node);
        value["outgoing"] = detail.outgoing.iter().map(|l| self.link(l)).collect();
        value["incoming"] = detail.incoming.iter().map(|l| self.link(l)).collect();
        Self::print(&value)
    }

    fn extracted(&self, node: &Node, content: &str) -> String {
        Self::print(&json!({
            "id": node.id.as_str(),
            "file": node.file,
            "location": node.location,
            "content": content,
        }))
    }

    fn relevant(&self, file: &str, nodes: &[RelevantNode]) -> String {
        Self::print(&json!({ "file": file, "nodes": nodes }))
    }

    fn checked(&self, report: &SyncReport, saved: bool) -> String {
        let changes: Vec<_> = report
            .changes()
            .map(|change| {
                json!({
                    "from": change.from.as_str(),
                    "to": change.to.as_str(),
                    "previous": self.labels.label(change.previous),
                    "current": self.labels.label(change.current),
                })
            })
            .collect();
        let totals: serde_json::Map<String, Value> = SyncStatus::ALL
            .into_iter()
            .map(|status| (self.labels.label(status).to_string(), report.count(status).into()))
            .collect();

        Self::print(&json!({
            "links": report.links.len(),
            "totals": totals,
            "changes": changes,
            "saved": saved,
        }))
    }

    fn confirmed(&self, node: &Node, reset: usize) -> String {
        Self::print(&json!({
            "id": node.id.as_str(),
            "checksum": node.checksum,
            "reset": reset,
        }))
    }

    fn summary(&self, summary: &Summary) -> String {
        let links: serde_json::Map<String, Value> = SyncStatus::ALL
            .into_iter()
            .map(|status| {
                let count = summary.links.get(&status).copied().unwrap_or_default();
                (self.labels.label(status).to_string(), count.into())
            })
            .collect();
        let cycles: Vec<Vec<&str>> = summary
            .cycles
            .iter()
            .map(|cycle| cycle.iter().map(NodeId::as_str).collect())
            .collect();

        Self::print(&json!({
            "types": summary.types,
            "total": summary.types.values().sum::<usize>(),
            "links": links,
            "cycles": {
                "count": cycles.len(),
                "members": cycles,
            },
        }))
    }
}
