use indicatif::ParallelProgressIterator;
use miette::{miette, Diagnostic, Result};
use num::ToPrimitive;
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    machine::{parse_lines, Machine},
    rational::AugmentedMatrix,
    search::MinCostSearch,
};

/// Press count for every button of a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub presses: Vec<u64>,
}

impl Configuration {
    pub fn total(&self) -> u64 {
        self.presses.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Diagnostic)]
pub enum SolveError {
    #[error("no combination of button presses reaches the joltage targets")]
    #[diagnostic(code(day10::solve::inconsistent))]
    Inconsistent,
    #[error("joltage targets need a negative or fractional number of presses")]
    #[diagnostic(code(day10::solve::no_integer_solution))]
    NoNonNegativeIntegerSolution,
}

/// Finds the configuration with the fewest total presses that brings every
/// counter exactly to its joltage target.
#[tracing::instrument(
    level = "debug",
    skip(machine),
    fields(buttons = machine.buttons.len(), counters = machine.counters())
)]
pub fn solve(machine: &Machine) -> Result<Configuration, SolveError> {
    let space = AugmentedMatrix::from_machine(machine)
        .into_rref()
        .solution_space()?;

    // A free variable is a button, so its value is its press count
    let limits = space
        .basis
        .iter()
        .map(|vector| machine.press_limit(vector.free))
        .collect();

    let mut search = MinCostSearch::new(&space, limits);
    let best = search.run();
    tracing::debug!(
        free = space.basis.len(),
        visited = search.visited(),
        "search finished"
    );

    let presses = space
        .evaluate(&best.ok_or(SolveError::NoNonNegativeIntegerSolution)?)
        .iter()
        .map(|x| x.to_integer().to_u64())
        .collect::<Option<Vec<_>>>()
        .ok_or(SolveError::NoNonNegativeIntegerSolution)?;

    Ok(Configuration { presses })
}

#[tracing::instrument(skip(input))]
pub fn process(input: &str) -> Result<String> {
    let machines = parse_lines(input)
        .filter_map(|(line, parsed)| match parsed {
            Ok(machine) => Some((line, machine)),
            Err(error) => {
                tracing::warn!(line, %error, "skipping malformed machine");
                None
            }
        })
        .collect::<Vec<_>>();

    if machines.is_empty() {
        return Err(miette!("Input contains no machine descriptions"));
    }

    let total: u64 = machines
        .par_iter()
        .progress_count(machines.len() as u64)
        .filter_map(|(line, machine)| match solve(machine) {
            Ok(configuration) => {
                tracing::debug!(line, presses = configuration.total(), "machine configured");
                Some(configuration.total())
            }
            Err(error) => {
                tracing::warn!(line, %error, "machine cannot be configured");
                None
            }
        })
        .sum();

    Ok(total.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;
    use rstest::rstest;

    const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    /// Counter levels reached by pressing each button `presses[b]` times.
    fn levels(machine: &Machine, presses: &[u64]) -> Vec<u64> {
        let mut levels = vec![0; machine.counters()];
        for (button, &count) in presses.iter().enumerate() {
            for counter in machine.incidence(button, machine.counters()).unique() {
                levels[counter] += count;
            }
        }
        levels
    }

    /// Cheapest configuration found by trying every press count up to the
    /// largest target on every button.
    fn brute_force(machine: &Machine) -> Option<u64> {
        let ceiling = machine.targets.iter().copied().max().unwrap_or(0);
        (0..machine.buttons.len())
            .map(|_| 0..=ceiling)
            .multi_cartesian_product()
            .filter(|presses| levels(machine, presses) == machine.targets)
            .map(|presses| presses.iter().sum())
            .min()
    }

    #[test]
    fn it_works() -> Result<()> {
        assert_eq!("33", process(EXAMPLE)?);
        Ok(())
    }

    #[rstest]
    #[case("[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}", 10)]
    #[case("[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}", 12)]
    #[case("[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}", 11)]
    fn example_machines(#[case] line: &str, #[case] expected: u64) -> Result<()> {
        let machine: Machine = line.parse()?;
        let configuration = solve(&machine)?;
        assert_eq!(configuration.total(), expected);
        assert_eq!(levels(&machine, &configuration.presses), machine.targets);
        Ok(())
    }

    #[rstest]
    #[case::example_one("(3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}")]
    #[case::example_two("(0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}")]
    #[case::example_three("(0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}")]
    #[case::negative_weight("(0) (1) (0,1) {3,3}")]
    #[case::shared_counters("(0,1) (1,2) (0,2) (0,1,2) {4,5,3}")]
    #[case::chain("(0) (0,1) (1,2) (2) {2,5,4}")]
    #[case::wide_button("(0,1,2) (0) (1) (2) {3,1,2}")]
    #[case::fractional_only("(0,1) (1,2) (0,2) {1,1,1}")]
    #[case::negative_only("(0,1) (1) (1,2) (2) {2,1,0}")]
    #[case::duplicate_wiring("(0,0,1) (1) {2,3}")]
    fn matches_brute_force(#[case] line: &str) -> Result<()> {
        let machine: Machine = line.parse()?;
        let expected = brute_force(&machine);
        match solve(&machine) {
            Ok(configuration) => {
                assert_eq!(Some(configuration.total()), expected);
                assert_eq!(levels(&machine, &configuration.presses), machine.targets);
            }
            Err(_) => assert_eq!(expected, None),
        }
        Ok(())
    }

    #[rstest]
    #[case::negative("(0,1) (1) {1,0}")]
    #[case::fractional("(0,1) (1,2) (0,2) {1,1,1}")]
    fn unique_solution_outside_the_naturals(#[case] line: &str) -> Result<()> {
        let machine: Machine = line.parse()?;
        assert_eq!(
            solve(&machine),
            Err(SolveError::NoNonNegativeIntegerSolution)
        );
        Ok(())
    }

    #[rstest]
    #[case::unwired_counter("(0) {1,2}")]
    #[case::no_buttons("{4}")]
    #[case::contradiction("(0,1) {1,2}")]
    fn targets_outside_column_space(#[case] line: &str) -> Result<()> {
        let machine: Machine = line.parse()?;
        assert_eq!(solve(&machine), Err(SolveError::Inconsistent));
        Ok(())
    }

    #[test]
    fn unwired_button_is_never_pressed() -> Result<()> {
        let machine: Machine = "() (0) (9) {4}".parse()?;
        assert_eq!(solve(&machine)?.presses, vec![0, 4, 0]);
        Ok(())
    }

    #[test]
    fn solving_twice_gives_the_same_configuration() -> Result<()> {
        for (_, machine) in parse_lines(EXAMPLE) {
            let machine = machine?;
            assert_eq!(solve(&machine)?, solve(&machine)?);
        }
        Ok(())
    }

    #[test]
    fn bad_machines_do_not_stop_the_run() -> Result<()> {
        let input = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
this is not a machine
(0) {1,2}
(0,1) (1) {1,0}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}";
        assert_eq!("22", process(input)?);
        Ok(())
    }

    #[test]
    fn input_without_machines_is_an_error() {
        assert!(process("").is_err());
        assert!(process("nothing to see here").is_err());
    }
}
