//! Keypad input state machine: digit entry, decimal point, operator chaining,
//! clear / clear-entry / backspace, and the four-function evaluation behind `=`.
//!
//! The display is kept as a string (what the user sees), and operands are parsed out
//! of it only when an operator or `=` is pressed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four keypad operators. Serialized with its keypad symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "×")]
    Multiply,
    #[serde(rename = "÷")]
    Divide,
}

impl Operator {
    /// Symbol shown on the keypad and used in expressions sent to the gateway.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
        }
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        calculate(lhs, rhs, *self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator: {}", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    /// Accepts the keypad symbols plus the ASCII aliases a terminal user will type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+" => Ok(Operator::Add),
            "-" | "−" => Ok(Operator::Subtract),
            "×" | "*" | "x" | "X" => Ok(Operator::Multiply),
            "÷" | "/" => Ok(Operator::Divide),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// Four-function evaluation. Division by zero is NaN rather than infinity.
pub fn calculate(lhs: f64, rhs: f64, op: Operator) -> f64 {
    match op {
        Operator::Add => lhs + rhs,
        Operator::Subtract => lhs - rhs,
        Operator::Multiply => lhs * rhs,
        Operator::Divide => {
            if rhs != 0.0 {
                lhs / rhs
            } else {
                f64::NAN
            }
        }
    }
}

/// Keypad state. Starts at display `"0"` with nothing pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorState {
    pub display: String,
    pub previous_value: Option<String>,
    pub operation: Option<Operator>,
    pub waiting_for_operand: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            previous_value: None,
            operation: None,
            waiting_for_operand: false,
        }
    }
}

impl CalculatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digit key. Anything that is not a single ASCII digit is ignored.
    pub fn input_digit(&mut self, digit: char) {
        if !digit.is_ascii_digit() {
            return;
        }
        if self.waiting_for_operand {
            self.display = digit.to_string();
            self.waiting_for_operand = false;
        } else if self.display == "0" {
            self.display = digit.to_string();
        } else {
            self.display.push(digit);
        }
    }

    pub fn input_decimal(&mut self) {
        if self.waiting_for_operand {
            self.display = "0.".to_string();
            self.waiting_for_operand = false;
        } else if !self.display.contains('.') {
            self.display.push('.');
        }
    }

    /// `C`: back to the initial state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `CE`: only the current entry is reset.
    pub fn clear_entry(&mut self) {
        self.display = "0".to_string();
    }

    pub fn backspace(&mut self) {
        if self.display.chars().count() > 1 {
            self.display.pop();
        } else {
            self.display = "0".to_string();
        }
    }

    /// Operator key. A pending operation is evaluated first, so `2 + 3 ×` shows `5`.
    pub fn perform_operation(&mut self, next: Operator) {
        match (&self.previous_value, self.operation) {
            (None, _) => {
                self.previous_value = Some(self.display.clone());
                self.operation = Some(next);
                self.waiting_for_operand = true;
            }
            (Some(previous), Some(op)) => {
                let result = calculate(parse_float(previous), parse_float(&self.display), op);
                let shown = format_number(result);
                self.display = shown.clone();
                self.previous_value = Some(shown);
                self.operation = Some(next);
                self.waiting_for_operand = true;
            }
            (Some(_), None) => {}
        }
    }

    /// `=` key. Returns the evaluated value when there was something to evaluate.
    pub fn perform_calculation(&mut self) -> Option<f64> {
        let previous = self.previous_value.as_deref()?;
        let op = self.operation?;
        let result = calculate(parse_float(previous), parse_float(&self.display), op);
        self.display = format_number(result);
        self.previous_value = None;
        self.operation = None;
        self.waiting_for_operand = true;
        Some(result)
    }

    /// The expression as the user sees it: `"12 × 3"` while an operation is pending,
    /// otherwise just the display.
    pub fn expression(&self) -> String {
        match (&self.previous_value, self.operation) {
            (Some(previous), Some(op)) => format!("{} {} {}", previous, op, self.display),
            _ => self.display.clone(),
        }
    }
}

/// Leading-float parse: the longest numeric prefix wins (`"5."` is 5, `"3abc"` is 3),
/// no digits at all is NaN. `Infinity` / `-Infinity` round-trip from [`format_number`].
pub fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Formats a value the way the keypad displays it: `4` not `4.0`, `NaN`, `Infinity`,
/// and exponent notation (`1e+21`, `1e-7`) outside `[1e-6, 1e21)`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let raw = format!("{:e}", value);
        return match raw.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => raw,
        };
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(state: &mut CalculatorState, keys: &str) {
        for key in keys.split_whitespace() {
            match key {
                "=" => {
                    state.perform_calculation();
                }
                "." => state.input_decimal(),
                "C" => state.clear(),
                "CE" => state.clear_entry(),
                "<" => state.backspace(),
                k if k.chars().all(|c| c.is_ascii_digit()) => {
                    k.chars().for_each(|c| state.input_digit(c))
                }
                op => state.perform_operation(op.parse().expect("operator")),
            }
        }
    }

    #[test]
    fn leading_zero_is_replaced() {
        let mut s = CalculatorState::new();
        press(&mut s, "0 0 7");
        assert_eq!(s.display, "7");
    }

    #[test]
    fn decimal_point_only_once() {
        let mut s = CalculatorState::new();
        press(&mut s, "1 . 2 . 5");
        assert_eq!(s.display, "1.25");
    }

    #[test]
    fn decimal_after_operator_starts_fresh_operand() {
        let mut s = CalculatorState::new();
        press(&mut s, "3 + .");
        assert_eq!(s.display, "0.");
        assert!(!s.waiting_for_operand);
        press(&mut s, "5 =");
        assert_eq!(s.display, "3.5");
    }

    #[test]
    fn simple_addition() {
        let mut s = CalculatorState::new();
        press(&mut s, "2 + 2 =");
        assert_eq!(s.display, "4");
        assert!(s.previous_value.is_none());
        assert!(s.operation.is_none());
        assert!(s.waiting_for_operand);
    }

    #[test]
    fn operator_chaining_evaluates_pending_operation() {
        let mut s = CalculatorState::new();
        press(&mut s, "2 + 3 ×");
        assert_eq!(s.display, "5");
        assert_eq!(s.previous_value.as_deref(), Some("5"));
        assert_eq!(s.operation, Some(Operator::Multiply));
        press(&mut s, "4 =");
        assert_eq!(s.display, "20");
    }

    #[test]
    fn expression_shows_pending_operation() {
        let mut s = CalculatorState::new();
        press(&mut s, "12 ×");
        assert_eq!(s.expression(), "12 × 12");
        press(&mut s, "3");
        assert_eq!(s.expression(), "12 × 3");
        press(&mut s, "=");
        assert_eq!(s.expression(), "36");
    }

    #[test]
    fn division_by_zero_is_nan() {
        let mut s = CalculatorState::new();
        press(&mut s, "8 ÷ 0 =");
        assert_eq!(s.display, "NaN");
        assert!(calculate(1.0, 0.0, Operator::Divide).is_nan());
    }

    #[test]
    fn clear_entry_keeps_pending_operation() {
        let mut s = CalculatorState::new();
        press(&mut s, "9 - 4 CE 2 =");
        assert_eq!(s.display, "7");
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = CalculatorState::new();
        press(&mut s, "9 - 4 C");
        assert_eq!(s, CalculatorState::default());
    }

    #[test]
    fn backspace_bottoms_out_at_zero() {
        let mut s = CalculatorState::new();
        press(&mut s, "4 2 <");
        assert_eq!(s.display, "4");
        press(&mut s, "< <");
        assert_eq!(s.display, "0");
    }

    #[test]
    fn equals_without_operation_is_noop() {
        let mut s = CalculatorState::new();
        press(&mut s, "5");
        assert_eq!(s.perform_calculation(), None);
        assert_eq!(s.display, "5");
        assert!(!s.waiting_for_operand);
    }

    #[test]
    fn floating_point_noise_is_preserved() {
        let mut s = CalculatorState::new();
        press(&mut s, ". 1 + . 2 =");
        assert_eq!(s.display, "0.30000000000000004");
    }

    #[test]
    fn ascii_operator_aliases() {
        assert_eq!("*".parse::<Operator>(), Ok(Operator::Multiply));
        assert_eq!("/".parse::<Operator>(), Ok(Operator::Divide));
        assert!("%".parse::<Operator>().is_err());
    }

    #[test]
    fn parse_float_takes_leading_number() {
        assert_eq!(parse_float("5."), 5.0);
        assert_eq!(parse_float("-2.5"), -2.5);
        assert_eq!(parse_float("3abc"), 3.0);
        assert_eq!(parse_float("1e+21"), 1e21);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float("NaN").is_nan());
        assert!(parse_float(".").is_nan());
    }

    #[test]
    fn format_number_matches_keypad_display() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }
}
