use std::collections::{BTreeSet, HashMap, HashSet};

use crate::program::model::Program;
use crate::program::resolver::{ResolvedParameter, SCALE_ID, SOURCE_ID};

#[derive(Clone, Debug, PartialEq)]
/// One row of the merged parameter table.
pub struct ParameterEntry {
    /// Parameter id.
    pub id: String,
    /// Index of the program the parameter was taken from.
    pub owner: usize,
    /// False for exclusive parameters, which get one row per owner.
    pub shared: bool,
    /// The parameter as resolved by its owner.
    pub parameter: ResolvedParameter,
}

/// Flat, ordered and deduplicated view of the parameters of several programs.
///
/// Built from scratch whenever it is requested after a change; see
/// [`crate::ProgramSet::table`].
#[derive(Clone, Debug, Default)]
pub struct ParameterTable {
    entries: Vec<ParameterEntry>,
    shared: HashMap<String, usize>,
    exclusive: HashMap<String, Vec<Option<usize>>>,
}

impl ParameterTable {
    /// Merges the required parameters of `programs`.
    ///
    /// `order` is the traversal order (key program first); `exclusive` holds
    /// the ids that stay per program.
    #[tracing::instrument(skip_all, fields(programs = programs.len()))]
    pub(crate) fn build(programs: &[Program], order: &[usize], exclusive: &BTreeSet<String>) -> Self {
        let mut seq: Vec<ParameterEntry> = order
            .iter()
            .flat_map(|&owner| {
                programs[owner]
                    .required_parameters()
                    .iter()
                    .map(move |p| ParameterEntry {
                        id: p.id.clone(),
                        owner,
                        shared: !exclusive.contains(&p.id),
                        parameter: p.clone(),
                    })
            })
            .collect();

        let keys = extern_order(programs, order);
        order_by_keys(&mut seq, &keys, order);
        let table = group(seq, programs.len());
        tracing::debug!(entries = table.entries.len(), "parameter table rebuilt");
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row at `position`.
    pub fn get(&self, position: usize) -> Option<&ParameterEntry> {
        self.entries.get(position)
    }

    /// Row for `id` as seen by program `owner`. Shared ids ignore `owner`.
    pub fn entry(&self, id: &str, owner: usize) -> Option<&ParameterEntry> {
        self.position(id, owner).map(|i| &self.entries[i])
    }

    /// Position of the row for `id` as seen by program `owner`.
    pub fn position(&self, id: &str, owner: usize) -> Option<usize> {
        if let Some(&i) = self.shared.get(id) {
            return Some(i);
        }
        self.exclusive.get(id)?.get(owner).copied().flatten()
    }

    /// Rows in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ParameterTable {
    type Item = &'a ParameterEntry;
    type IntoIter = std::slice::Iter<'a, ParameterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Declared ids of all programs, merged so that each program's declaration
/// order is kept: ids unknown so far are inserted right before the next id
/// that is already placed. `Source` and `Scale` lead.
pub(crate) fn extern_order(programs: &[Program], order: &[usize]) -> Vec<String> {
    let mut list = vec![SOURCE_ID.to_owned(), SCALE_ID.to_owned()];
    let mut pending: Vec<String> = Vec::new();

    for &i in order {
        for decl in programs[i].extern_declarations() {
            match list.iter().position(|k| *k == decl.id) {
                Some(pos) => {
                    list.splice(pos..pos, pending.drain(..));
                }
                None => pending.push(decl.id.clone()),
            }
        }
        list.append(&mut pending);
    }

    let mut seen = HashSet::new();
    list.retain(|id| seen.insert(id.clone()));
    list
}

/// Moves, for every key and every program in traversal order, the run that
/// starts at that program's entry for the key and ends before the next key
/// entry, to the end of the already placed prefix.
fn order_by_keys(seq: &mut [ParameterEntry], keys: &[String], order: &[usize]) {
    let is_key: HashSet<&str> = keys.iter().map(String::as_str).collect();
    let mut placed = 0;

    for key in keys {
        for &owner in order {
            let Some(start) =
                (placed..seq.len()).find(|&j| seq[j].id == *key && seq[j].owner == owner)
            else {
                continue;
            };
            let end = (start + 1..seq.len())
                .find(|&j| is_key.contains(seq[j].id.as_str()))
                .unwrap_or(seq.len());
            move_range(seq, start, end, placed);
            placed += end - start;
        }
    }
}

/// Moves `seq[start..end]` to `pos` (`pos <= start`) with three reversals.
///
/// `[a, b, c, d, e]` with `start = 2, end = 4, pos = 1` becomes `[a, c, d, b, e]`.
pub(crate) fn move_range<T>(seq: &mut [T], start: usize, end: usize, pos: usize) {
    if start == pos {
        return;
    }
    let len = end - start;
    seq[pos..end].reverse();
    seq[pos..pos + len].reverse();
    seq[pos + len..end].reverse();
}

/// Keeps the first row of every shared id and every row of exclusive ids.
fn group(seq: Vec<ParameterEntry>, program_count: usize) -> ParameterTable {
    let mut table = ParameterTable::default();
    for e in seq {
        let at = table.entries.len();
        if e.shared {
            if table.shared.contains_key(&e.id) {
                continue;
            }
            table.shared.insert(e.id.clone(), at);
        } else {
            let slots = table
                .exclusive
                .entry(e.id.clone())
                .or_insert_with(|| vec![None; program_count]);
            slots[e.owner] = Some(at);
        }
        table.entries.push(e);
    }
    table
}

#[cfg(test)]
#[path = "../../tests/unit/provider/table.rs"]
mod tests;
