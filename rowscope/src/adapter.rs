///
/// # Scope Adapters
///
/// A `ScopeAdapter` reinterprets the flat column list of a result row as a
/// tree of named scopes. Each node selects some of its parent's columns and
/// may define named child scopes over its own selection:
///
/// ```text
/// root (All)                       id name id t1id name id t1id name t1id name t5count
/// ├── t1      Range(0..2)          id name
/// ├── t2Left  Range(2..5)                  id t1id name
/// ├── pair    Empty                (no columns of its own)
/// │   ├── left   Range(2..5)               id t1id name
/// │   └── right  Range(5..8)                            id t1id name
/// └── suffix  Range(10..11)                                                   t5count
/// ```
///
/// ## Index Translation
///
/// Selections are local to the parent's columns. A `Range(0..2)` under a node
/// that itself selects physical columns `5..8` designates physical columns
/// `5` and `6`. Resolution against a `ColumnLayout` composes these
/// translations once, producing a `ResolvedScope` whose columns carry their
/// physical index, so reading a scoped value is a single lookup.
///
/// An `Empty` node (built with `ScopeAdapter::nested`) selects nothing itself;
/// its children select from its parent's columns. It groups scopes without
/// claiming their columns, so a left-join presence check on the group only
/// looks at the children.
///
/// ## Splitting
///
/// `splitting_adapters` builds consecutive ranges for entities selected back
/// to back in one SELECT list, plus a suffix range for whatever remains
/// (computed columns, aggregates).
///

use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::errors::LayoutError;
use crate::layout::ColumnLayout;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnSelection {
    /// Every column of the parent, in order.
    #[default]
    All,
    Range(Range<usize>),
    /// Every column of the parent starting at the given index.
    Suffix(usize),
    Indices(Vec<usize>),
    /// `(exposed name, parent column name)` pairs.
    Mapping(Vec<(String, String)>),
    /// No columns; nested scopes select from the parent.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeAdapter {
    selection: ColumnSelection,
    scopes: IndexMap<String, ScopeAdapter>,
}

impl ScopeAdapter {
    pub fn new(selection: ColumnSelection) -> Self {
        Self {
            selection,
            scopes: IndexMap::new(),
        }
    }

    /// Identity adapter: all columns, no scopes.
    pub fn unscoped() -> Self {
        Self::new(ColumnSelection::All)
    }

    pub fn range(range: Range<usize>) -> Self {
        Self::new(ColumnSelection::Range(range))
    }

    pub fn suffix(from: usize) -> Self {
        Self::new(ColumnSelection::Suffix(from))
    }

    pub fn indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        Self::new(ColumnSelection::Indices(indices.into_iter().collect()))
    }

    pub fn mapping<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        Self::new(ColumnSelection::Mapping(
            pairs
                .into_iter()
                .map(|(alias, column)| (alias.into(), column.into()))
                .collect(),
        ))
    }

    /// A node with no columns of its own grouping the given named scopes.
    pub fn nested<I, N>(scopes: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (N, ScopeAdapter)>,
        N: Into<String>,
    {
        Self::new(ColumnSelection::Empty).with_scopes(scopes)
    }

    /// A node exposing all parent columns with the given named scopes.
    pub fn scopes<I, N>(scopes: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (N, ScopeAdapter)>,
        N: Into<String>,
    {
        Self::unscoped().with_scopes(scopes)
    }

    pub fn with_scope(
        mut self,
        name: impl Into<String>,
        adapter: ScopeAdapter,
    ) -> Result<Self, LayoutError> {
        match self.scopes.entry(name.into()) {
            Entry::Occupied(entry) => Err(LayoutError::DuplicateScope(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(adapter);
                Ok(self)
            }
        }
    }

    pub fn with_scopes<I, N>(self, scopes: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (N, ScopeAdapter)>,
        N: Into<String>,
    {
        scopes
            .into_iter()
            .try_fold(self, |adapter, (name, scope)| adapter.with_scope(name, scope))
    }

    pub fn selection(&self) -> &ColumnSelection {
        &self.selection
    }

    pub fn scope(&self, name: &str) -> Option<&ScopeAdapter> {
        self.scopes.get(name)
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// Physical range covered by this adapter when applied directly to a
    /// layout of `total_columns` columns. `None` for non-contiguous selections.
    pub fn covered_range(&self, total_columns: usize) -> Option<Range<usize>> {
        match &self.selection {
            ColumnSelection::All => Some(0..total_columns),
            ColumnSelection::Range(range) => Some(range.clone()),
            ColumnSelection::Suffix(from) => Some(*from..total_columns),
            ColumnSelection::Empty => Some(0..0),
            ColumnSelection::Indices(_) | ColumnSelection::Mapping(_) => None,
        }
    }

    /// Validates the adapter against a statement layout and translates every
    /// scope to physical column indices.
    pub fn resolve(&self, layout: &ColumnLayout) -> Result<ResolvedScope, LayoutError> {
        let root = ResolvedScope::unscoped(layout);
        self.resolve_in(&root.columns)
    }

    fn resolve_in(&self, parent: &[ResolvedColumn]) -> Result<ResolvedScope, LayoutError> {
        let available = parent.len();
        let columns: Vec<ResolvedColumn> = match &self.selection {
            ColumnSelection::All => parent.to_vec(),
            ColumnSelection::Range(range) => {
                if range.start > range.end || range.end > available {
                    return Err(LayoutError::RangeOutOfBounds {
                        start: range.start,
                        end: range.end,
                        available,
                    });
                }
                parent[range.clone()].to_vec()
            }
            ColumnSelection::Suffix(from) => {
                if *from > available {
                    return Err(LayoutError::RangeOutOfBounds {
                        start: *from,
                        end: available,
                        available,
                    });
                }
                parent[*from..].to_vec()
            }
            ColumnSelection::Indices(indices) => indices
                .iter()
                .map(|&index| {
                    parent
                        .get(index)
                        .cloned()
                        .ok_or(LayoutError::IndexOutOfBounds { index, available })
                })
                .collect::<Result<_, _>>()?,
            ColumnSelection::Mapping(pairs) => pairs
                .iter()
                .map(|(alias, column)| {
                    parent
                        .iter()
                        .find(|c| c.name.eq_ignore_ascii_case(column))
                        .map(|c| ResolvedColumn {
                            name: Arc::from(alias.as_str()),
                            index: c.index,
                        })
                        .ok_or_else(|| LayoutError::MissingColumn {
                            column: column.clone(),
                            alias: alias.clone(),
                        })
                })
                .collect::<Result<_, _>>()?,
            ColumnSelection::Empty => Vec::new(),
        };

        let base = match self.selection {
            ColumnSelection::Empty => parent,
            _ => &columns[..],
        };
        let mut scopes = IndexMap::with_capacity(self.scopes.len());
        for (name, child) in &self.scopes {
            scopes.insert(name.clone(), Arc::new(child.resolve_in(base)?));
        }

        Ok(ResolvedScope {
            columns: columns.into(),
            scopes,
        })
    }
}

/// One column of a resolved scope: the name it is exposed under and its
/// physical index in the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub name: Arc<str>,
    pub index: usize,
}

/// A `ScopeAdapter` validated against a specific layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    columns: Arc<[ResolvedColumn]>,
    scopes: IndexMap<String, Arc<ResolvedScope>>,
}

impl ResolvedScope {
    /// Every physical column under its original name, no scopes.
    pub fn unscoped(layout: &ColumnLayout) -> Self {
        Self {
            columns: layout
                .column_names()
                .iter()
                .enumerate()
                .map(|(index, name)| ResolvedColumn {
                    name: Arc::from(name.as_str()),
                    index,
                })
                .collect(),
            scopes: IndexMap::new(),
        }
    }

    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    pub fn physical_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.iter().map(|c| c.index)
    }

    pub fn scope(&self, name: &str) -> Option<&Arc<ResolvedScope>> {
        self.scopes.get(name)
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    pub fn has_scopes(&self) -> bool {
        !self.scopes.is_empty()
    }
}

/// Partitions `0..total_columns` into `sizes.len() + 1` consecutive ranges:
/// one per requested size, in order, then a suffix range with the remaining
/// columns (possibly empty).
pub fn splitting_adapters(
    sizes: &[usize],
    total_columns: usize,
) -> Result<Vec<ScopeAdapter>, LayoutError> {
    let requested = sizes
        .iter()
        .try_fold(0usize, |acc, &size| acc.checked_add(size))
        .unwrap_or(usize::MAX);
    if requested > total_columns {
        return Err(LayoutError::NotEnoughColumns {
            requested,
            available: total_columns,
        });
    }

    let mut adapters = Vec::with_capacity(sizes.len() + 1);
    let mut offset = 0;
    for &size in sizes {
        adapters.push(ScopeAdapter::range(offset..offset + size));
        offset += size;
    }
    adapters.push(ScopeAdapter::range(offset..total_columns));
    Ok(adapters)
}
