use bitvec::prelude::*;
use miette::{miette, Diagnostic, Result};
use rayon::prelude::*;
use thiserror::Error;

use crate::machine::{parse_lines, Machine};

/// One bit per button (plus the target bit when used as a matrix row).
type Lights = BitVec<usize, Lsb0>;

/// Above this many free buttons the `2^k` walk over the null space is not
/// worth attempting.
const MAX_FREE_BUTTONS: usize = 24;

#[derive(Debug, Error, Diagnostic)]
pub enum LightsError {
    #[error("machine has no indicator light diagram")]
    #[diagnostic(code(day10::lights::missing_diagram))]
    MissingDiagram,
    #[error("no combination of button presses lights the diagram")]
    #[diagnostic(code(day10::lights::unreachable))]
    Unreachable,
    #[error("{0} free buttons is too many to enumerate")]
    #[diagnostic(code(day10::lights::too_many_free_buttons))]
    TooManyFreeButtons(usize),
}

/// Toggle equations over GF(2). Row `i` marks the buttons wired to light `i`,
/// and its last bit says whether that light must end up on.
struct ToggleSystem {
    rows: Vec<Lights>,
    buttons: usize,
}

impl ToggleSystem {
    fn new(diagram: &[bool], machine: &Machine) -> Self {
        let buttons = machine.buttons.len();
        let mut rows = diagram
            .iter()
            .map(|&lit| {
                let mut row = Lights::repeat(false, buttons + 1);
                row.set(buttons, lit);
                row
            })
            .collect::<Vec<_>>();

        for button in 0..buttons {
            for light in machine.incidence(button, diagram.len()) {
                rows[light].set(button, true);
            }
        }

        Self { rows, buttons }
    }

    /// Brings the rows to reduced echelon form, XOR-ing the pivot row into
    /// every other row that shares its column. Returns the pivot columns, or
    /// `None` when a light must be on but no button reaches it anymore.
    fn reduce(&mut self) -> Option<Vec<usize>> {
        let mut pivots = Vec::new();

        for col in 0..self.buttons {
            let next = pivots.len();
            if next == self.rows.len() {
                break;
            }
            let Some(found) = (next..self.rows.len()).find(|&r| self.rows[r][col]) else {
                continue;
            };
            self.rows.swap(next, found);

            let pivot = self.rows[next].clone();
            for (r, row) in self.rows.iter_mut().enumerate() {
                if r != next && row[col] {
                    *row ^= &pivot;
                }
            }
            pivots.push(col);
        }

        let buttons = self.buttons;
        let stuck = self.rows[pivots.len()..].iter().any(|row| row[buttons]);
        (!stuck).then_some(pivots)
    }
}

/// Fewest presses that switch on exactly the lights the diagram marks.
pub fn min_toggles(machine: &Machine) -> Result<usize, LightsError> {
    let diagram = machine
        .diagram
        .as_deref()
        .ok_or(LightsError::MissingDiagram)?;

    let mut system = ToggleSystem::new(diagram, machine);
    let pivots = system.reduce().ok_or(LightsError::Unreachable)?;
    let n = system.buttons;

    let mut presses = Lights::repeat(false, n);
    for (row, &col) in pivots.iter().enumerate() {
        presses.set(col, system.rows[row][n]);
    }

    // Flipping a free button flips every pivot button whose row contains it
    let basis = (0..n)
        .filter(|col| !pivots.contains(col))
        .map(|free| {
            let mut flips = Lights::repeat(false, n);
            flips.set(free, true);
            for (row, &col) in pivots.iter().enumerate() {
                if system.rows[row][free] {
                    flips.set(col, true);
                }
            }
            flips
        })
        .collect::<Vec<_>>();

    if basis.len() > MAX_FREE_BUTTONS {
        return Err(LightsError::TooManyFreeButtons(basis.len()));
    }

    // Gray code walk: step `i` toggles the basis vector at the lowest set bit of `i`
    let mut fewest = presses.count_ones();
    for step in 1usize..1 << basis.len() {
        presses ^= &basis[step.trailing_zeros() as usize];
        fewest = fewest.min(presses.count_ones());
    }

    Ok(fewest)
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

    let total: usize = machines
        .par_iter()
        .filter_map(|(line, machine)| match min_toggles(machine) {
            Ok(presses) => Some(presses),
            Err(error) => {
                tracing::warn!(line, %error, "indicator lights cannot be matched");
                None
            }
        })
        .sum();

    Ok(total.to_string())
}
