//! `math` package: arithmetic and equation solving.
//!
//! Input is either one arithmetic expression (`3 * 12 - 5`) or one or more
//! equations separated by `;` or newlines (`x + y = 10; x - y = 2`).
//!
//! Grammar (usual precedence, `^` right-associative, implicit
//! multiplication before identifiers and parentheses, so `2x` is `2 * x`):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary | power)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?
//! primary := number | ident | ident '(' expr ')' | '(' expr ')'
//! ```
//!
//! Identifiers: constants `pi`, `e`; functions `sqrt`, `abs`, `ln`,
//! `sin`, `cos`, `tan`; anything else is a variable.
//!
//! Linear systems are solved exactly by row reduction. A single nonlinear
//! equation in one variable is solved numerically for its real roots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use thiserror::Error;

use crate::capabilities::{Capability, Package, RegistryError};

/// Errors raised while evaluating or solving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("variable '{0}' has no value; write an equation to solve for it")]
    UnboundVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("nothing to solve")]
    Empty,

    #[error("'{0}' must be an equation with a single '='")]
    NotAnEquation(String),

    #[error("nonlinear systems are only solved for a single equation in one variable")]
    NonlinearSystem,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy)]
enum Func {
    Sqrt,
    Abs,
    Ln,
    Sin,
    Cos,
    Tan,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "ln" => Func::Ln,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            _ => return None,
        })
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Func::Sqrt => x.sqrt(),
            Func::Abs => x.abs(),
            Func::Ln => x.ln(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(Op, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

type Env = BTreeMap<String, f64>;

impl Expr {
    fn binary(op: Op, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    fn eval(&self, env: &Env) -> Result<f64, MathError> {
        Ok(match self {
            Expr::Num(n) => *n,
            Expr::Var(name) => *env
                .get(name)
                .ok_or_else(|| MathError::UnboundVariable(name.clone()))?,
            Expr::Neg(inner) => -inner.eval(env)?,
            Expr::Call(func, arg) => func.apply(arg.eval(env)?),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(env)?, rhs.eval(env)?);
                match op {
                    Op::Add => a + b,
                    Op::Sub => a - b,
                    Op::Mul => a * b,
                    Op::Div | Op::Rem if b == 0.0 => return Err(MathError::DivisionByZero),
                    Op::Div => a / b,
                    Op::Rem => a % b,
                    Op::Pow => a.powf(b),
                }
            }
        })
    }

    fn collect_vars(&self, vars: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) => {}
            Expr::Var(name) => {
                vars.insert(name.clone());
            }
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.collect_vars(vars),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_vars(vars);
                rhs.collect_vars(vars);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), MathError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(ch) => Err(MathError::UnexpectedChar { ch, pos: self.pos }),
            None => Err(MathError::UnexpectedEnd),
        }
    }

    fn parse(mut self) -> Result<Expr, MathError> {
        let expr = self.expr()?;
        if let Some(ch) = self.peek() {
            return Err(MathError::UnexpectedChar { ch, pos: self.pos });
        }
        Ok(expr)
    }

    fn expr(&mut self) -> Result<Expr, MathError> {
        let mut expr = self.term()?;
        loop {
            if self.eat('+') {
                expr = Expr::binary(Op::Add, expr, self.term()?);
            } else if self.eat('-') {
                expr = Expr::binary(Op::Sub, expr, self.term()?);
            } else {
                return Ok(expr);
            }
        }
    }

    fn term(&mut self) -> Result<Expr, MathError> {
        let mut expr = self.unary()?;
        loop {
            if self.eat('*') {
                expr = Expr::binary(Op::Mul, expr, self.unary()?);
            } else if self.eat('/') {
                expr = Expr::binary(Op::Div, expr, self.unary()?);
            } else if self.eat('%') {
                expr = Expr::binary(Op::Rem, expr, self.unary()?);
            } else if self.peek().is_some_and(|c| c == '(' || c.is_alphabetic()) {
                expr = Expr::binary(Op::Mul, expr, self.power()?);
            } else {
                return Ok(expr);
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, MathError> {
        if self.eat('-') {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, MathError> {
        let base = self.primary()?;
        if self.eat('^') {
            return Ok(Expr::binary(Op::Pow, base, self.unary()?));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, MathError> {
        match self.peek() {
            None => Err(MathError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let expr = self.expr()?;
                self.expect(')')?;
                Ok(expr)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() => self.identifier(),
            Some(ch) => Err(MathError::UnexpectedChar { ch, pos: self.pos }),
        }
    }

    fn number(&mut self) -> Result<Expr, MathError> {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == '.')
        {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map(Expr::Num)
            .map_err(|_| MathError::InvalidNumber(literal))
    }

    fn identifier(&mut self) -> Result<Expr, MathError> {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        match name.to_lowercase().as_str() {
            "pi" => return Ok(Expr::Num(std::f64::consts::PI)),
            "e" => return Ok(Expr::Num(std::f64::consts::E)),
            lower => {
                if let Some(func) = Func::from_name(lower) {
                    self.expect('(')?;
                    let arg = self.expr()?;
                    self.expect(')')?;
                    return Ok(Expr::Call(func, Box::new(arg)));
                }
            }
        }
        Ok(Expr::Var(name))
    }
}

fn parse(source: &str) -> Result<Expr, MathError> {
    Parser::new(source).parse()
}

/// Evaluate an arithmetic expression with no variables.
pub fn evaluate(expression: &str) -> Result<f64, MathError> {
    let value = parse(expression)?.eval(&Env::new())?;
    if !value.is_finite() {
        return Err(MathError::NotFinite);
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Solving
// ---------------------------------------------------------------------------

/// Outcome of solving a set of equations.
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// No variables: whether every equation holds.
    Holds(bool),
    /// One value per variable, in name order.
    Unique(Vec<(String, f64)>),
    /// Real roots of a single-variable equation, ascending.
    Roots { variable: String, roots: Vec<f64> },
    /// Contradictory equations.
    Inconsistent,
    /// Too few independent equations to pin down every variable.
    Underdetermined,
}

struct Equation {
    lhs: Expr,
    rhs: Expr,
}

impl Equation {
    fn residual(&self, env: &Env) -> Option<f64> {
        let value = self.lhs.eval(env).ok()? - self.rhs.eval(env).ok()?;
        value.is_finite().then_some(value)
    }
}

const LINEAR_EPS: f64 = 1e-9;
const ROOT_EPS: f64 = 1e-7;

fn residuals(equations: &[Equation], vars: &[String], point: &[f64]) -> Option<Vec<f64>> {
    let env: Env = vars.iter().cloned().zip(point.iter().copied()).collect();
    equations.iter().map(|eq| eq.residual(&env)).collect()
}

/// Fit `r(x) = r0 + A x` and confirm the fit at off-axis points.
fn linearize(equations: &[Equation], vars: &[String]) -> Option<(Vec<Vec<f64>>, Vec<f64>)> {
    let n = vars.len();
    let r0 = residuals(equations, vars, &vec![0.0; n])?;

    let mut columns = Vec::with_capacity(n);
    for j in 0..n {
        let mut unit = vec![0.0; n];
        unit[j] = 1.0;
        let r = residuals(equations, vars, &unit)?;
        columns.push(r.iter().zip(&r0).map(|(a, b)| a - b).collect::<Vec<_>>());
    }
    let a: Vec<Vec<f64>> = (0..equations.len())
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect();

    let checks: [Vec<f64>; 2] = [
        (0..n).map(|j| 1.5 + 0.75 * j as f64).collect(),
        (0..n).map(|j| -2.25 - 1.25 * j as f64).collect(),
    ];
    for point in &checks {
        let actual = residuals(equations, vars, point)?;
        for (i, value) in actual.iter().enumerate() {
            let predicted = r0[i] + a[i].iter().zip(point).map(|(c, x)| c * x).sum::<f64>();
            if (predicted - value).abs() > LINEAR_EPS * (1.0 + value.abs().max(predicted.abs())) {
                return None;
            }
        }
    }
    Some((a, r0))
}

/// Row-reduce `A x = b`.
fn solve_linear(a: Vec<Vec<f64>>, b: Vec<f64>, n: usize) -> Result<Vec<f64>, Solution> {
    let mut m: Vec<Vec<f64>> = a
        .into_iter()
        .zip(b)
        .map(|(mut row, rhs)| {
            row.push(rhs);
            row
        })
        .collect();

    let mut rank = 0;
    for col in 0..n {
        let Some(pivot) = (rank..m.len()).max_by(|&x, &y| m[x][col].abs().total_cmp(&m[y][col].abs()))
        else {
            break;
        };
        if m[pivot][col].abs() < LINEAR_EPS {
            continue;
        }
        m.swap(rank, pivot);
        let lead = m[rank][col];
        for value in m[rank].iter_mut() {
            *value /= lead;
        }
        for row in 0..m.len() {
            if row != rank {
                let factor = m[row][col];
                if factor != 0.0 {
                    for k in col..=n {
                        let delta = factor * m[rank][k];
                        m[row][k] -= delta;
                    }
                }
            }
        }
        rank += 1;
    }

    if m[rank..].iter().any(|row| row[n].abs() > LINEAR_EPS) {
        return Err(Solution::Inconsistent);
    }
    if rank < n {
        return Err(Solution::Underdetermined);
    }
    Ok(m[..n].iter().map(|row| row[n]).collect())
}

fn sample_points() -> Vec<f64> {
    let outer: Vec<f64> = (1..=100).map(|k| 100.0 * 1.1f64.powi(k)).collect();
    let mut xs: Vec<f64> = outer.iter().rev().map(|x| -x).collect();
    xs.extend((0..=4000).map(|k| -100.0 + k as f64 * 0.05));
    xs.extend(outer);
    xs
}

fn bisect(f: &dyn Fn(f64) -> Option<f64>, mut lo: f64, mut hi: f64, f_lo: f64, f_hi: f64) -> Option<f64> {
    let tolerance = ROOT_EPS * (1.0 + f_lo.abs().min(f_hi.abs()));
    let lo_negative = f_lo < 0.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid == lo || mid == hi {
            break;
        }
        let value = f(mid)?;
        if value == 0.0 {
            return Some(mid);
        }
        if (value < 0.0) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let root = 0.5 * (lo + hi);
    (f(root)?.abs() <= tolerance).then_some(root)
}

/// Minimize `|f|` on `[a, b]`; catches roots where `f` touches zero without
/// changing sign.
fn touch_root(f: &dyn Fn(f64) -> Option<f64>, mut a: f64, mut b: f64) -> Option<f64> {
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    for _ in 0..200 {
        let c = b - ratio * (b - a);
        let d = a + ratio * (b - a);
        if f(c)?.abs() < f(d)?.abs() {
            b = d;
        } else {
            a = c;
        }
    }
    let root = 0.5 * (a + b);
    (f(root)?.abs() <= ROOT_EPS * ROOT_EPS).then_some(root)
}

fn real_roots(f: &dyn Fn(f64) -> Option<f64>) -> Vec<f64> {
    let xs = sample_points();
    let ys: Vec<Option<f64>> = xs.iter().map(|&x| f(x)).collect();

    let mut roots = Vec::new();
    for i in 0..xs.len() {
        let Some(y) = ys[i] else { continue };
        if y == 0.0 {
            roots.push(xs[i]);
            continue;
        }
        let next = ys.get(i + 1).copied().flatten();
        if let Some(y_next) = next {
            if y_next != 0.0 && (y < 0.0) != (y_next < 0.0) {
                roots.extend(bisect(f, xs[i], xs[i + 1], y, y_next));
            }
        }
        let prev = i.checked_sub(1).and_then(|p| ys[p]);
        if let (Some(y_prev), Some(y_next)) = (prev, next) {
            if y.abs() <= y_prev.abs() && y.abs() <= y_next.abs() {
                roots.extend(touch_root(f, xs[i - 1], xs[i + 1]));
            }
        }
    }

    roots.sort_by(|a, b| a.total_cmp(b));
    roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-6 * (1.0 + b.abs()));
    roots
}

fn parse_equations(input: &str) -> Result<Vec<Equation>, MathError> {
    let statements: Vec<&str> = input
        .split(|c| c == ';' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if statements.is_empty() {
        return Err(MathError::Empty);
    }
    statements
        .into_iter()
        .map(|statement| match statement.split_once('=') {
            Some((lhs, rhs)) if !rhs.contains('=') => Ok(Equation {
                lhs: parse(lhs)?,
                rhs: parse(rhs)?,
            }),
            _ => Err(MathError::NotAnEquation(statement.to_string())),
        })
        .collect()
}

/// Solve one or more equations separated by `;` or newlines.
pub fn solve_equations(input: &str) -> Result<Solution, MathError> {
    let equations = parse_equations(input)?;

    let mut names = BTreeSet::new();
    for eq in &equations {
        eq.lhs.collect_vars(&mut names);
        eq.rhs.collect_vars(&mut names);
    }
    let vars: Vec<String> = names.into_iter().collect();

    if vars.is_empty() {
        let env = Env::new();
        let mut holds = true;
        for eq in &equations {
            let diff = eq.lhs.eval(&env)? - eq.rhs.eval(&env)?;
            holds &= diff.abs() <= LINEAR_EPS * (1.0 + eq.rhs.eval(&env)?.abs());
        }
        return Ok(Solution::Holds(holds));
    }

    if let Some((a, r0)) = linearize(&equations, &vars) {
        let b: Vec<f64> = r0.iter().map(|r| -r).collect();
        return Ok(match solve_linear(a, b, vars.len()) {
            Ok(values) => Solution::Unique(vars.into_iter().zip(values).collect()),
            Err(degenerate) => degenerate,
        });
    }

    if vars.len() != 1 || equations.len() != 1 {
        return Err(MathError::NonlinearSystem);
    }
    let variable = vars[0].clone();
    let equation = &equations[0];
    let f = |x: f64| {
        let env: Env = [(variable.clone(), x)].into_iter().collect();
        equation.residual(&env)
    };
    let roots = real_roots(&f);
    Ok(Solution::Roots { variable, roots })
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn rounded(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let r = (value * scale).round() / scale;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

fn describe(solution: &Solution) -> String {
    match solution {
        Solution::Holds(true) => "The statement is true.".to_string(),
        Solution::Holds(false) => "The statement is false.".to_string(),
        Solution::Unique(values) => {
            let assignments: Vec<String> = values
                .iter()
                .map(|(name, v)| format!("{} = {}", name, format_number(rounded(*v, 9))))
                .collect();
            format!("The solution is {}.", assignments.join(", "))
        }
        Solution::Roots { variable, roots } => match roots.as_slice() {
            [] => format!("There is no real solution for {}.", variable),
            [root] => format!("The solution is {} = {}.", variable, format_number(rounded(*root, 6))),
            many => {
                let mut text = String::from("The solutions are ");
                for (i, root) in many.iter().enumerate() {
                    if i > 0 {
                        text.push_str(" or ");
                    }
                    let _ = write!(text, "{} = {}", variable, format_number(rounded(*root, 6)));
                }
                text.push('.');
                text
            }
        },
        Solution::Inconsistent => "The equations have no solution.".to_string(),
        Solution::Underdetermined => "The equations have infinitely many solutions.".to_string(),
    }
}

/// Capability entry point: evaluate an expression or solve equations.
pub fn solve(input: &str) -> anyhow::Result<String> {
    let input = input.trim();
    if input.contains('=') {
        let solution = solve_equations(input)?;
        return Ok(format!(
            "{}\nEquations: ```\n{}\n```",
            describe(&solution),
            input
        ));
    }
    let value = evaluate(input)?;
    Ok(format!(
        "The result is {}.\nExpression: ```\n{}\n```",
        format_number(value),
        input
    ))
}

pub fn package() -> Result<Package, RegistryError> {
    Package::new(
        "math",
        vec![Capability::new(
            "solve",
            "Evaluates arithmetic and solves equations",
            solve,
        )
        .with_input_spec(
            "Either a single arithmetic expression, or one or more equations separated by ';'. \
             Use + - * / % ^, parentheses, the constants pi and e, the functions \
             sqrt, abs, ln, sin, cos, tan, and single-word variable names",
        )
        .with_example("user: What is 1 + 1?\nassistant: 1 + 1")
        .with_example("user: Hey bot what's the square root of Pi\nassistant: sqrt(pi)")
        .with_example("user: Can you solve x + 1 = 2?\nassistant: x + 1 = 2")
        .with_example(
            "user: Two numbers add up to 10 and differ by 2, what are they?\n\
             assistant: a + b = 10; a - b = 2",
        )
        .with_counter_example("user: What is 1 + 1?\nassistant: 1 + 1 = 2")
        .with_counter_example("user: Can you solve x + 1 = 2?\nassistant: x = 1")
        .with_counter_example("user: What is 2 to the power of 8?\nassistant: two to the eighth")],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> f64 {
        evaluate(s).unwrap()
    }

    fn unique(input: &str) -> Vec<(String, f64)> {
        match solve_equations(input).unwrap() {
            Solution::Unique(values) => values,
            other => panic!("expected a unique solution, got {:?}", other),
        }
    }

    fn roots(input: &str) -> Vec<f64> {
        match solve_equations(input).unwrap() {
            Solution::Roots { roots, .. } => roots,
            other => panic!("expected roots, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(eval("1 + 1"), 2.0);
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("-2 ^ 2"), -4.0);
        assert_eq!(eval("7 % 4"), 3.0);
        assert_eq!(eval("3 * 12 - 5"), 31.0);
        assert_eq!(eval("2(3 + 4)"), 14.0);
    }

    #[test]
    fn test_constants_and_functions() {
        assert!((eval("sqrt(pi)") - std::f64::consts::PI.sqrt()).abs() < 1e-12);
        assert_eq!(eval("abs(-3.5)"), 3.5);
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert!((eval("ln(e)") - 1.0).abs() < 1e-12);
        assert!((eval("2pi") - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_errors() {
        assert_eq!(evaluate("1 / 0"), Err(MathError::DivisionByZero));
        assert_eq!(evaluate("1 +"), Err(MathError::UnexpectedEnd));
        assert_eq!(evaluate(""), Err(MathError::UnexpectedEnd));
        assert_eq!(evaluate("1 + x"), Err(MathError::UnboundVariable("x".to_string())));
        assert!(matches!(evaluate("(1 + 2"), Err(MathError::UnexpectedEnd)));
        assert!(matches!(evaluate("1 2"), Err(MathError::UnexpectedChar { ch: '2', .. })));
        assert!(matches!(evaluate("1..2"), Err(MathError::InvalidNumber(_))));
        assert_eq!(evaluate("sqrt(-1)"), Err(MathError::NotFinite));
    }

    #[test]
    fn test_single_linear_equation() {
        assert_eq!(unique("x + 1 = 2"), vec![("x".to_string(), 1.0)]);
        assert_eq!(unique("2x + 3 = 7"), vec![("x".to_string(), 2.0)]);
        assert_eq!(unique("3 * (y - 1) = y + 5"), vec![("y".to_string(), 4.0)]);
    }

    #[test]
    fn test_linear_system() {
        let values = unique("a + b = 10; a - b = 2");
        assert_eq!(values, vec![("a".to_string(), 6.0), ("b".to_string(), 4.0)]);

        let values = unique("x + y + z = 6\n2x - y = 0\nz = 3");
        assert_eq!(values.len(), 3);
        assert!((values[0].1 - 1.0).abs() < 1e-9);
        assert!((values[1].1 - 2.0).abs() < 1e-9);
        assert!((values[2].1 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_linear_systems() {
        assert_eq!(solve_equations("x + y = 1; x + y = 2"), Ok(Solution::Inconsistent));
        assert_eq!(solve_equations("x + y = 1; 2x + 2y = 2"), Ok(Solution::Underdetermined));
        assert_eq!(solve_equations("x = x + 1"), Ok(Solution::Inconsistent));
    }

    #[test]
    fn test_nonlinear_single_variable() {
        let found = roots("x^2 = 4");
        assert_eq!(found.len(), 2);
        assert!((found[0] + 2.0).abs() < 1e-6);
        assert!((found[1] - 2.0).abs() < 1e-6);

        let found = roots("1 / x = 2");
        assert_eq!(found.len(), 1);
        assert!((found[0] - 0.5).abs() < 1e-6);

        let found = roots("x^2 - 2x + 1 = 0");
        assert_eq!(found.len(), 1);
        assert!((found[0] - 1.0).abs() < 1e-6);

        assert!(roots("x^2 = -1").is_empty());
    }

    #[test]
    fn test_statements_without_variables() {
        assert_eq!(solve_equations("1 + 1 = 2"), Ok(Solution::Holds(true)));
        assert_eq!(solve_equations("1 + 1 = 3"), Ok(Solution::Holds(false)));
    }

    #[test]
    fn test_solve_errors() {
        assert_eq!(solve_equations(" ; "), Err(MathError::Empty));
        assert_eq!(
            solve_equations("x = 1 = 2"),
            Err(MathError::NotAnEquation("x = 1 = 2".to_string()))
        );
        assert_eq!(solve_equations("x * y = 6; x + y = 5"), Err(MathError::NonlinearSystem));
    }

    #[test]
    fn test_solve_formats_reply() {
        assert_eq!(
            solve(" 1 + 1 ").unwrap(),
            "The result is 2.\nExpression: ```\n1 + 1\n```"
        );
        assert!(solve("2 / 4").unwrap().starts_with("The result is 0.5."));
        assert_eq!(
            solve("x + 1 = 2").unwrap(),
            "The solution is x = 1.\nEquations: ```\nx + 1 = 2\n```"
        );
        assert!(solve("a + b = 10; a - b = 2")
            .unwrap()
            .starts_with("The solution is a = 6, b = 4."));
        assert!(solve("x^2 = 4")
            .unwrap()
            .starts_with("The solutions are x = -2 or x = 2."));
        assert!(solve("x^2 = -1")
            .unwrap()
            .starts_with("There is no real solution for x."));
    }

    #[test]
    fn test_solve_propagates_errors() {
        let err = solve("1/0").unwrap_err();
        assert_eq!(err.to_string(), "division by zero");
    }
}
