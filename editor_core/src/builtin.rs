//! Built-in command behaviour
//!
//! These run inside an update transaction when no listener claims a
//! command. Each returns `Ok(true)` when it handled the command.

use core_types::NodeKey;

use crate::node::{ListTag, NodeKind, TextFormatType};
use crate::selection::{Point, PointKind, RangeSelection, Selection};
use crate::transaction::UpdateTxn;
use crate::tree::{DocumentTree, TreeResult};

/// Distinct top-level blocks touched by a range, in document order
pub fn touched_blocks(tree: &DocumentTree, range: &RangeSelection) -> TreeResult<Vec<NodeKey>> {
    let mut blocks: Vec<NodeKey> = Vec::new();
    for key in range.nodes(tree)? {
        if key == tree.root() {
            continue;
        }
        let block = tree.top_level_element(key)?;
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Splits text nodes at the range boundaries so that the selection covers
/// whole nodes; returns the adjusted range with its direction preserved
fn split_boundaries(txn: &mut UpdateTxn<'_>, range: &RangeSelection) -> TreeResult<RangeSelection> {
    let backward = range.is_backward(txn.tree())?;
    let (mut start, mut end) = range.ordered(txn.tree())?;

    // End first: splitting it never moves the start offset.
    if end.kind == PointKind::Text {
        let len = txn.tree().char_len(end.key)?;
        if end.offset > 0 && end.offset < len {
            txn.split_text(end.key, end.offset)?;
        }
    }
    if start.kind == PointKind::Text {
        let len = txn.tree().char_len(start.key)?;
        if start.offset > 0 && start.offset < len {
            let right = txn.split_text(start.key, start.offset)?;
            if end.key == start.key {
                end = Point::text(right, end.offset - start.offset);
            }
            start = Point::text(right, 0);
        }
    }

    let (anchor, focus) = if backward { (end, start) } else { (start, end) };
    Ok(RangeSelection::new(anchor, focus).with_format(range.format))
}

pub(crate) fn format_text(txn: &mut UpdateTxn<'_>, format_type: TextFormatType) -> TreeResult<bool> {
    let Some(range) = txn.range_selection().cloned() else {
        return Ok(false);
    };
    let flag = format_type.flag();

    if range.is_collapsed() {
        let pending = range.format.toggle(flag);
        txn.set_selection(Some(range.with_format(pending).into()));
        return Ok(true);
    }

    let range = split_boundaries(txn, &range)?;
    let texts = range.selected_text_nodes(txn.tree())?;
    let remove = !texts.is_empty() && range.has_format(txn.tree(), flag)?;

    for key in &texts {
        let current = txn.tree().kind(*key)?.text_format().unwrap_or_default();
        let next = if remove {
            current.without(flag)
        } else {
            current.with(flag)
        };
        txn.set_format(*key, next)?;
    }

    let pending = if remove {
        range.format.without(flag)
    } else {
        range.format.with(flag)
    };
    txn.set_selection(Some(range.with_format(pending).into()));
    Ok(true)
}

pub(crate) fn insert_list(txn: &mut UpdateTxn<'_>, tag: ListTag) -> TreeResult<bool> {
    let Some(range) = txn.range_selection().cloned() else {
        return Ok(false);
    };
    let blocks = touched_blocks(txn.tree(), &range)?;

    let mut current: Option<NodeKey> = None;
    for block in blocks {
        if let Some(existing) = txn.tree().kind(block)?.list_tag() {
            if existing != tag {
                txn.set_kind(block, NodeKind::List(tag))?;
            }
            current = Some(block);
            continue;
        }

        let list = match current.filter(|list| directly_precedes(txn.tree(), *list, block)) {
            Some(list) => list,
            None => {
                let list = txn.create_list(tag);
                txn.insert_before(block, list)?;
                list
            }
        };
        let item = txn.create_list_item();
        txn.append(list, item)?;
        txn.move_children(block, item)?;
        txn.remap_selection(block, item);
        txn.remove(block)?;
        current = Some(list);
    }
    Ok(true)
}

pub(crate) fn remove_list(txn: &mut UpdateTxn<'_>) -> TreeResult<bool> {
    let Some(range) = txn.range_selection().cloned() else {
        return Ok(false);
    };
    for block in touched_blocks(txn.tree(), &range)? {
        if !txn.tree().kind(block)?.is_list() {
            continue;
        }
        let items = txn.tree().children(block)?.to_vec();
        for item in items {
            let paragraph = txn.create_paragraph();
            txn.insert_before(block, paragraph)?;
            txn.move_children(item, paragraph)?;
            txn.remap_selection(item, paragraph);
        }
        txn.remove(block)?;
    }
    Ok(true)
}

pub(crate) fn toggle_link(txn: &mut UpdateTxn<'_>, url: Option<&str>) -> TreeResult<bool> {
    let Some(range) = txn.range_selection().cloned() else {
        return Ok(false);
    };
    match url {
        Some(url) => apply_link(txn, &range, url)?,
        None => remove_links(txn, &range)?,
    }
    Ok(true)
}

fn enclosing_link(tree: &DocumentTree, key: NodeKey) -> Option<NodeKey> {
    tree.find_ancestor(key, NodeKind::is_link)
}

fn apply_link(txn: &mut UpdateTxn<'_>, range: &RangeSelection, url: &str) -> TreeResult<()> {
    if range.is_collapsed() {
        // Only an existing link can be retargeted from a caret.
        if let Some(link) = enclosing_link(txn.tree(), range.anchor.key) {
            txn.set_link_url(link, url)?;
        }
        return Ok(());
    }

    let range = split_boundaries(txn, range)?;
    let texts = range.selected_text_nodes(txn.tree())?;

    // Runs of adjacent siblings share one new link node.
    let mut runs: Vec<Vec<NodeKey>> = Vec::new();
    for key in texts {
        if let Some(link) = enclosing_link(txn.tree(), key) {
            txn.set_link_url(link, url)?;
            continue;
        }
        let extends_run = runs
            .last()
            .and_then(|run| run.last())
            .map(|last| directly_precedes(txn.tree(), *last, key))
            .unwrap_or(false);
        match runs.last_mut() {
            Some(run) if extends_run => run.push(key),
            _ => runs.push(vec![key]),
        }
    }

    for run in runs {
        let link = txn.create_link(url);
        txn.insert_before(run[0], link)?;
        for key in run {
            txn.append(link, key)?;
        }
    }
    txn.set_selection(Some(Selection::Range(range)));
    Ok(())
}

fn remove_links(txn: &mut UpdateTxn<'_>, range: &RangeSelection) -> TreeResult<()> {
    let mut links = Vec::new();
    for key in range.nodes(txn.tree())? {
        if let Some(link) = enclosing_link(txn.tree(), key) {
            if !links.contains(&link) {
                links.push(link);
            }
        }
    }
    for link in links {
        let Some(parent) = txn.tree().parent(link)? else {
            continue;
        };
        let children = txn.tree().children(link)?.to_vec();
        for child in children {
            txn.insert_before(link, child)?;
        }
        txn.remap_selection(link, parent);
        txn.remove(link)?;
    }
    Ok(())
}

/// True when `a` is the sibling immediately before `b`
fn directly_precedes(tree: &DocumentTree, a: NodeKey, b: NodeKey) -> bool {
    let (Ok(Some(pa)), Ok(Some(pb))) = (tree.parent(a), tree.parent(b)) else {
        return false;
    };
    if pa != pb {
        return false;
    }
    match (tree.index_in_parent(a), tree.index_in_parent(b)) {
        (Ok(Some(ia)), Ok(Some(ib))) => ia + 1 == ib,
        _ => false,
    }
}
