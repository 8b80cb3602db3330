//! Parsing of user-supplied (x, y) data tables.
//!
//! One row per line, two cells separated by a comma, semicolon, tab or
//! spaces. Blank lines and `#` comments are skipped. A first row that does
//! not parse as numbers is taken as a header.

use estima_core::{EstimaError, EstimaResult, Sample};

fn split_cells(line: &str) -> Vec<&str> {
    if line.contains([',', ';', '\t']) {
        line.split([',', ';', '\t']).map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

pub fn parse_table(text: &str) -> EstimaResult<Vec<Sample>> {
    let mut samples = Vec::new();
    let mut first_row = true;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = idx + 1;
        let cells = split_cells(line);

        if first_row {
            first_row = false;
            let numeric = cells.iter().all(|c| c.parse::<f64>().is_ok());
            if !numeric && cells.iter().all(|c| !c.is_empty()) {
                continue;
            }
        }

        samples.push(parse_cells(&cells, row)?);
    }

    if samples.is_empty() {
        return Err(EstimaError::Validation(
            "the data table is empty; enter at least one (x, y) pair".into(),
        ));
    }
    Ok(samples)
}

/// Parse a single `x,y` pair as given on the command line.
pub fn parse_point(s: &str) -> Result<Sample, String> {
    let cells: Vec<&str> = s.split(',').map(str::trim).collect();
    parse_cells(&cells, 1).map_err(|e| format!("invalid point '{s}': {e}"))
}

fn parse_cells(cells: &[&str], row: usize) -> EstimaResult<Sample> {
    if cells.len() != 2 {
        return Err(EstimaError::Validation(format!(
            "row {row}: expected 2 cells (x, y), found {}",
            cells.len()
        )));
    }
    let cell = |i: usize, name: &str| -> EstimaResult<f64> {
        let c = cells[i];
        if c.is_empty() {
            return Err(EstimaError::Validation(format!(
                "row {row}: empty {name} cell; make sure no cells are empty"
            )));
        }
        c.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                EstimaError::Validation(format!("row {row}: {name} value '{c}' is not a number"))
            })
    };
    Ok(Sample::new(cell(0, "x")?, cell(1, "y")?))
}
