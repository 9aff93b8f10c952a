use std::{fmt::Display, str::FromStr};

use chumsky::prelude::*;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

/// A single factory machine, as described by one line of the manual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Indicator light diagram (`#` is on). Only the lights puzzle needs it.
    pub diagram: Option<Vec<bool>>,
    /// Counter (or light) indices wired to each button, as written.
    pub buttons: Vec<Vec<usize>>,
    /// Joltage level each counter has to reach.
    pub targets: Vec<u64>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("malformed machine description: {0}")]
    #[diagnostic(code(day10::parse::syntax))]
    Syntax(String),
    #[error("machine has no joltage requirements block")]
    #[diagnostic(
        code(day10::parse::missing_targets),
        help("every machine needs exactly one `{{a,b,...}}` block")
    )]
    MissingTargets,
    #[error("machine lists {0} joltage requirement blocks, expected exactly one")]
    #[diagnostic(code(day10::parse::duplicate_targets))]
    DuplicateTargets(usize),
    #[error("machine lists {0} indicator diagrams, expected at most one")]
    #[diagnostic(code(day10::parse::duplicate_diagram))]
    DuplicateDiagram(usize),
}

impl Machine {
    pub fn counters(&self) -> usize {
        self.targets.len()
    }

    /// Indices touched by `button` that fit in a row of `width` entries.
    ///
    /// Wiring that points past the end of the row is dropped rather than
    /// rejected.
    pub fn incidence(&self, button: usize, width: usize) -> impl Iterator<Item = usize> + '_ {
        self.buttons
            .get(button)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&i| i < width)
    }

    /// Upper bound on how many times `button` can be pressed in any valid
    /// configuration.
    ///
    /// Every press adds one to each counter the button is wired to, so the
    /// count can never exceed the smallest of those targets. A button wired
    /// to nothing only adds cost, so its limit is zero.
    pub fn press_limit(&self, button: usize) -> u64 {
        self.incidence(button, self.counters())
            .map(|i| self.targets[i])
            .min()
            .unwrap_or(0)
    }
}

enum Segment {
    Diagram(Vec<bool>),
    Button(Vec<usize>),
    Targets(Vec<u64>),
}

fn number<'a, T>() -> impl Parser<'a, &'a str, T, extra::Err<Rich<'a, char>>> + Clone
where
    T: FromStr,
    T::Err: Display,
{
    text::int(10).try_map(|digits: &str, span| {
        digits
            .parse::<T>()
            .map_err(|e| Rich::custom(span, format!("`{digits}`: {e}")))
    })
}

fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Segment>, extra::Err<Rich<'a, char>>> {
    // Custom whitespace parser that excludes newlines
    let hspace = one_of(" \t").repeated();

    let light = choice((just('.').to(false), just('#').to(true)));

    // [.##.]
    let diagram = light
        .repeated()
        .collect::<Vec<bool>>()
        .delimited_by(just('['), just(']'))
        .map(Segment::Diagram);

    // (0,2,3)
    let button = number::<usize>()
        .separated_by(just(','))
        .collect::<Vec<usize>>()
        .delimited_by(just('('), just(')'))
        .map(Segment::Button);

    // {3,5,4,7}
    let targets = number::<u64>()
        .separated_by(just(','))
        .collect::<Vec<u64>>()
        .delimited_by(just('{'), just('}'))
        .map(Segment::Targets);

    choice((diagram, button, targets))
        .padded_by(hspace)
        .repeated()
        .collect()
}

impl FromStr for Machine {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let segments = parser().parse(line).into_result().map_err(|errors| {
            ParseError::Syntax(errors.iter().map(|e| format!("{e:?}")).join("; "))
        })?;

        let mut diagrams = Vec::new();
        let mut buttons = Vec::new();
        let mut target_blocks = Vec::new();
        for segment in segments {
            match segment {
                Segment::Diagram(lights) => diagrams.push(lights),
                Segment::Button(wiring) => buttons.push(wiring),
                Segment::Targets(levels) => target_blocks.push(levels),
            }
        }

        if target_blocks.len() > 1 {
            return Err(ParseError::DuplicateTargets(target_blocks.len()));
        }
        if diagrams.len() > 1 {
            return Err(ParseError::DuplicateDiagram(diagrams.len()));
        }
        let targets = target_blocks.pop().ok_or(ParseError::MissingTargets)?;

        Ok(Machine {
            diagram: diagrams.pop(),
            buttons,
            targets,
        })
    }
}

/// Parses every non-blank line of `input`, tagging each result with its
/// 1-based line number so callers can report and skip bad lines.
pub fn parse_lines(input: &str) -> impl Iterator<Item = (usize, Result<Machine, ParseError>)> + '_ {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.trim().parse()))
}
