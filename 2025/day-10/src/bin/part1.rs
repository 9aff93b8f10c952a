use miette::*;

use aoc2025_day_10::part1;

const INPUT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/input1.txt");

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let input = std::fs::read_to_string(INPUT)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read puzzle input from {INPUT}"))?;
    let result = part1::process(&input)?;
    println!("Result: {}", result);
    Ok(())
}
