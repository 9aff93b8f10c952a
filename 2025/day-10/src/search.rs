use num::{BigRational, Signed};

use crate::rational::{is_non_negative_integral, SolutionSpace};

/// Depth-first search over the free variables of a [`SolutionSpace`] for the
/// non-negative integer point with the lowest total.
///
/// Free variables are assigned in basis order, each enumerated from zero up
/// to its limit. Two rules cut the tree:
///
/// - a component that is negative and that no unassigned free variable can
///   raise makes the branch infeasible;
/// - a partial cost at or above the best known total ends the branch, but
///   only while every unassigned free variable has a non-negative weight.
///   A negative weight ahead could still bring the cost down.
pub struct MinCostSearch<'a> {
    space: &'a SolutionSpace,
    limits: Vec<u64>,
    weights: Vec<BigRational>,
    /// `rescuable[depth][i]`: a basis vector at index `>= depth` raises component `i`.
    rescuable: Vec<Vec<bool>>,
    /// `monotone[depth]`: no basis vector at index `>= depth` lowers the cost.
    monotone: Vec<bool>,
    assignment: Vec<u64>,
    best: Option<(BigRational, Vec<u64>)>,
    visited: u64,
}

enum Cut {
    /// This value is infeasible, a larger one might not be.
    Skip,
    /// This value and every larger one are infeasible.
    Stop,
}

impl<'a> MinCostSearch<'a> {
    /// `limits[i]` is the largest value tried for the `i`-th free variable.
    pub fn new(space: &'a SolutionSpace, limits: Vec<u64>) -> Self {
        debug_assert_eq!(limits.len(), space.basis.len());

        let free = space.basis.len();
        let weights = space.weights();

        let mut rescuable = vec![vec![false; space.num_vars()]; free + 1];
        let mut monotone = vec![true; free + 1];
        for depth in (0..free).rev() {
            rescuable[depth] = rescuable[depth + 1]
                .iter()
                .zip(&space.basis[depth].direction)
                .map(|(&later, step)| later || step.is_positive())
                .collect();
            monotone[depth] = monotone[depth + 1] && !weights[depth].is_negative();
        }

        Self {
            space,
            limits,
            weights,
            rescuable,
            monotone,
            assignment: Vec::with_capacity(free),
            best: None,
            visited: 0,
        }
    }

    /// Runs the search and returns the best free-variable assignment, if any
    /// point of the space within the limits is a non-negative integer vector.
    pub fn run(&mut self) -> Option<Vec<u64>> {
        let x = self.space.particular.clone();
        let cost = x.iter().sum();
        self.descend(x, cost);
        self.best.as_ref().map(|(_, assignment)| assignment.clone())
    }

    /// Number of search nodes entered so far.
    pub fn visited(&self) -> u64 {
        self.visited
    }

    fn descend(&mut self, x: Vec<BigRational>, cost: BigRational) {
        self.visited += 1;
        let depth = self.assignment.len();

        if self.stranded(depth, &x) {
            return;
        }
        let monotone = self.monotone[depth];
        if monotone && self.dominated(&cost) {
            return;
        }

        let space = self.space;
        let Some(vector) = space.basis.get(depth) else {
            if is_non_negative_integral(&x) {
                self.best = Some((cost, self.assignment.clone()));
            }
            return;
        };
        let weight = self.weights[depth].clone();

        let (mut x, mut cost) = (x, cost);
        for c in 0..=self.limits[depth] {
            if c > 0 {
                for (value, step) in x.iter_mut().zip(&vector.direction) {
                    *value += step;
                }
                cost += &weight;
            }

            // Weights from here on are non-negative, so cost only grows with c
            if monotone && self.dominated(&cost) {
                break;
            }
            match self.cut(depth, &x, &vector.direction) {
                Some(Cut::Stop) => break,
                Some(Cut::Skip) => continue,
                None => {}
            }

            self.assignment.push(c);
            self.descend(x.clone(), cost.clone());
            self.assignment.pop();
        }
    }

    fn dominated(&self, cost: &BigRational) -> bool {
        self.best.as_ref().is_some_and(|(best, _)| cost >= best)
    }

    /// A component is stranded when it is negative and nothing left to
    /// assign at `depth` or later can raise it.
    fn stranded(&self, depth: usize, x: &[BigRational]) -> bool {
        x.iter()
            .zip(&self.rescuable[depth])
            .any(|(value, &rescuable)| value.is_negative() && !rescuable)
    }

    fn cut(&self, depth: usize, x: &[BigRational], direction: &[BigRational]) -> Option<Cut> {
        let mut cut = None;
        for ((value, &rescuable), step) in x.iter().zip(&self.rescuable[depth + 1]).zip(direction) {
            if value.is_negative() && !rescuable {
                if !step.is_positive() {
                    return Some(Cut::Stop);
                }
                cut = Some(Cut::Skip);
            }
        }
        cut
    }
}
