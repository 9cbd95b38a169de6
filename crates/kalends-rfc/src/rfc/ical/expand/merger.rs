//! Lazy k-way merge of sorted iterators.

use std::cmp::Ordering;

struct Input<I: Iterator, T> {
    iter: I,
    head: Option<I::Item>,
    tag: T,
}

/// Merges already-sorted inputs into one sorted stream.
///
/// Each step yields the smallest head under `compare` together with the tag
/// its input was registered with, then advances only that input. Equal heads
/// come out in registration order.
pub struct Merger<I: Iterator, T, F> {
    inputs: Vec<Input<I, T>>,
    compare: F,
}

impl<I, T, F> Merger<I, T, F>
where
    I: Iterator,
    F: FnMut(&I::Item, &I::Item) -> Ordering,
{
    #[must_use]
    pub fn new(compare: F) -> Self {
        Self {
            inputs: Vec::new(),
            compare,
        }
    }

    /// Registers an input. Its first element is pulled immediately.
    pub fn push(&mut self, mut iter: I, tag: T) {
        let head = iter.next();
        self.inputs.push(Input { iter, head, tag });
    }

    /// Registers an input, builder style.
    #[must_use]
    pub fn with(mut self, iter: I, tag: T) -> Self {
        self.push(iter, tag);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.iter().all(|input| input.head.is_none())
    }
}

impl<I, T, F> Iterator for Merger<I, T, F>
where
    I: Iterator,
    T: Clone,
    F: FnMut(&I::Item, &I::Item) -> Ordering,
{
    type Item = (I::Item, T);

    fn next(&mut self) -> Option<Self::Item> {
        let mut best: Option<usize> = None;
        for (index, input) in self.inputs.iter().enumerate() {
            let Some(head) = &input.head else { continue };
            let better = match best.and_then(|b| self.inputs[b].head.as_ref()) {
                Some(current) => (self.compare)(head, current) == Ordering::Less,
                None => true,
            };
            if better {
                best = Some(index);
            }
        }

        let input = &mut self.inputs[best?];
        let item = input.head.take()?;
        input.head = input.iter.next();
        Some((item, input.tag.clone()))
    }
}

impl<I: Iterator, T, F> std::fmt::Debug for Merger<I, T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Merger")
            .field("inputs", &self.inputs.len())
            .finish_non_exhaustive()
    }
}
