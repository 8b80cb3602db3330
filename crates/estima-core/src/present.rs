//! Human-readable rendering of estimator results. Every number is shown with
//! four decimals unless noted otherwise.

use crate::mle::MleResult;
use crate::regression::RegressionResult;

pub const LIKELIHOOD_FORMULA: &str = "L(p) = p^x (1 - p)^(n - x)";
pub const ESTIMATOR_FORMULA: &str = "p̂ = x / n";
pub const LINEAR_FORMULA: &str = "y = m·x + b";

pub fn estimate_line(result: &MleResult) -> String {
    format!("The estimated value of p̂ is: {:.4}", result.estimate)
}

/// One line per coefficient, highest power first, intercept last.
pub fn coefficient_lines(result: &RegressionResult) -> Vec<String> {
    let degree = result.degree();
    if degree == 1 {
        return vec![
            format!("Slope (m): {:.4}", result.coefficients[0]),
            format!("Intercept (b): {:.4}", result.coefficients[1]),
        ];
    }
    result
        .coefficients
        .iter()
        .enumerate()
        .map(|(i, c)| match degree - i {
            0 => format!("Intercept: {c:.4}"),
            1 => format!("Coefficient of x: {c:.4}"),
            power => format!("Coefficient of x^{power}: {c:.4}"),
        })
        .collect()
}

/// The fitted polynomial written out, e.g. `y = 1.7500x + 3.8500`.
pub fn polynomial_line(result: &RegressionResult) -> String {
    let degree = result.degree();
    let mut out = String::from("y =");
    for (i, c) in result.coefficients.iter().enumerate() {
        let power = degree - i;
        match (i, *c < 0.0) {
            (0, true) => out.push_str(" -"),
            (0, false) => out.push(' '),
            (_, true) => out.push_str(" - "),
            (_, false) => out.push_str(" + "),
        }
        match power {
            0 => out.push_str(&format!("{:.4}", c.abs())),
            1 => out.push_str(&format!("{:.4}x", c.abs())),
            p => out.push_str(&format!("{:.4}x^{p}", c.abs())),
        }
    }
    out
}

/// Reading of a straight-line fit in terms of the machine example.
/// Values here use two decimals.
pub fn slope_interpretation(m: f64, b: f64) -> String {
    let mut text = format!("The slope (m) is {m:.2} and the intercept (b) is {b:.2}.\n");
    if m > 0.0 {
        text.push_str(
            "This indicates a positive relationship between hours worked and production. \
             As hours worked increase, production also tends to increase.",
        );
    } else if m < 0.0 {
        text.push_str(
            "This indicates a negative relationship between hours worked and production. \
             As hours worked increase, production tends to decrease.",
        );
    } else {
        text.push_str(
            "This indicates there is no linear relationship between hours worked and production.",
        );
    }
    text
}

pub fn residual_lines(xs: &[f64], residuals: &[f64]) -> Vec<String> {
    xs.iter()
        .zip(residuals)
        .map(|(x, r)| format!("x = {x:.4}: residual {r:+.4}"))
        .collect()
}
