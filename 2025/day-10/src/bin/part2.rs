use miette::*;

use aoc2025_day_10::part2;

const INPUT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/input2.txt");

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let input = std::fs::read_to_string(INPUT)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read puzzle input from {INPUT}"))?;
    let result = part2::process(&input)?;
    println!("Result: {}", result);
    Ok(())
}
