//! Structural diagnostics for pages.
//!
//! Reports parent-reference anomalies without modifying the page. The
//! hierarchy builder already normalises every one of these, so the
//! findings are advisory: they explain why a block rendered as a root or
//! vanished from the tree.

use crate::id::BlockId;
use crate::model::Page;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// The block does not render where its data says it should.
    Warning,
    /// Informational; rendering is unaffected.
    Info,
}

/// A single lint diagnostic for a block.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The block this diagnostic refers to.
    pub block_id: BlockId,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-parent", "parent-cycle").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the page and return diagnostics in page order.
#[must_use]
pub fn lint_page(page: &Page) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_parent_refs(page, &mut diags);
    lint_parent_cycles(page, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Dangling, self-referencing, and non-division parents.
fn lint_parent_refs(page: &Page, diags: &mut Vec<LintDiagnostic>) {
    for block in page.iter() {
        let Some(parent_id) = block.parent_id else {
            continue;
        };
        if parent_id == block.id {
            diags.push(LintDiagnostic {
                block_id: block.id,
                message: format!("`{}` is its own parent; it renders as a root.", block.id),
                severity: LintSeverity::Warning,
                rule: "self-parent",
            });
            continue;
        }
        match page.get(parent_id) {
            None => diags.push(LintDiagnostic {
                block_id: block.id,
                message: format!(
                    "`{}` points at missing parent `{parent_id}`; it renders as a root.",
                    block.id
                ),
                severity: LintSeverity::Warning,
                rule: "dangling-parent",
            }),
            Some(parent) if !parent.is_parentable() => diags.push(LintDiagnostic {
                block_id: block.id,
                message: format!(
                    "`{}` is nested under {} `{parent_id}`; only divisions should hold children.",
                    block.id,
                    parent.block_type()
                ),
                severity: LintSeverity::Info,
                rule: "non-division-parent",
            }),
            Some(_) => {}
        }
    }
}

/// Cycles in the parent graph. Members never reach the rendered tree.
fn lint_parent_cycles(page: &Page, diags: &mut Vec<LintDiagnostic>) {
    let mut graph: DiGraphMap<BlockId, ()> = DiGraphMap::new();
    for block in page.iter() {
        graph.add_node(block.id);
    }
    for block in page.iter() {
        if let Some(parent_id) = block.parent_id
            && parent_id != block.id
            && page.contains(parent_id)
        {
            graph.add_edge(parent_id, block.id, ());
        }
    }

    for mut component in tarjan_scc(&graph) {
        if component.len() < 2 {
            continue;
        }
        component.sort_by_key(|id| page.blocks.get_index_of(id));
        let members: Vec<&str> = component.iter().map(BlockId::as_str).collect();
        diags.push(LintDiagnostic {
            block_id: component[0],
            message: format!(
                "Parent cycle through {}; these blocks are unreachable from any root.",
                members.join(" → ")
            ),
            severity: LintSeverity::Warning,
            rule: "parent-cycle",
        });
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
