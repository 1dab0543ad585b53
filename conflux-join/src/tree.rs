use crate::awaitable::SourceId;

/// The value shape a completed awaitable produced.
///
/// Events may emit nothing, one value, or a list
/// of values; a nested combinator completes with
/// its own [`Tree`]. Keeping the shapes as a
/// closed union lets the tree queries match
/// exhaustively instead of probing an untyped
/// slot.
#[derive(Clone, Debug)]
pub enum Outcome<V>
where
    V: Clone + 'static,
{
    /// A void completion.
    Empty,
    /// A single-valued completion.
    Single(V),
    /// A multi-valued emission, in emission order.
    Many(Vec<V>),
    /// The completion tree of a nested combinator.
    Nested(Tree<V>),
}

/// One completed awaitable paired with what it
/// produced.
#[derive(Clone, Debug)]
pub struct Record<V>
where
    V: Clone + 'static,
{
    source: SourceId,
    outcome: Outcome<V>,
}

impl<V> Record<V>
where
    V: Clone + 'static,
{
    pub(crate) fn new(source: SourceId, outcome: Outcome<V>) -> Self {
        Self { source, outcome }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn outcome(&self) -> &Outcome<V> {
        &self.outcome
    }
}

/// Completion records of one combinator, ordered
/// by completion time.
///
/// The engine appends records while it is live and
/// moves the tree out when it fires, so a tree a
/// caller observes is final: completion events
/// deliver each subscriber its own clone.
#[derive(Clone, Debug)]
pub struct Tree<V>
where
    V: Clone + 'static,
{
    records: Vec<Record<V>>,
}

impl<V> Default for Tree<V>
where
    V: Clone + 'static,
{
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<V> Tree<V>
where
    V: Clone + 'static,
{
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records at this level, in completion
    /// order. Nested trees are not expanded; see
    /// [`Tree::flatten`] for that.
    pub fn records(&self) -> &[Record<V>] {
        &self.records
    }

    /// Whether a record for `source` exists at this
    /// level or inside any nested tree.
    pub fn has(&self, source: SourceId) -> bool {
        self.get(source).is_some()
    }

    /// The outcome recorded for `source`, searching
    /// this level first and then nested trees in
    /// completion order.
    pub fn get(&self, source: SourceId) -> Option<&Outcome<V>> {
        for record in &self.records {
            if record.source == source {
                return Some(&record.outcome);
            }
        }
        for record in &self.records {
            if let Outcome::Nested(tree) = &record.outcome {
                if let Some(outcome) = tree.get(source) {
                    return Some(outcome);
                }
            }
        }
        None
    }

    /// Every leaf record across all nesting levels,
    /// depth-first. Records holding nested trees
    /// are descended into, not yielded.
    pub fn flatten(&self) -> Vec<&Record<V>> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a Record<V>>) {
        for record in &self.records {
            match &record.outcome {
                Outcome::Nested(tree) => tree.collect_leaves(leaves),
                _ => leaves.push(record),
            }
        }
    }

    pub(crate) fn push(&mut self, record: Record<V>) {
        self.records.push(record);
    }
}
