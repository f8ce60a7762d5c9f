// @file parser.rs
// @brief `x y [weight]` point table parser

use anyhow::{Context, Result, anyhow, bail};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub weight: Option<f64>,
}

/// Yields one point per data row; blank lines and `#` comments are skipped.
/// Columns are separated by whitespace and/or commas.
pub struct PointParser<T>
where
    T: Iterator<Item = std::io::Result<String>>,
{
    it: T,
    line_no: usize,
}

impl<T> PointParser<T>
where
    T: Iterator<Item = std::io::Result<String>>,
{
    pub fn new(it: T) -> PointParser<T> {
        PointParser { it, line_no: 0 }
    }

    fn parse_row(line: &str) -> Result<Point> {
        let cols = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>();
        if !(2..=3).contains(&cols.len()) {
            bail!("expected 2 or 3 columns, got {}", cols.len());
        }
        let num = |s: &str| s.parse::<f64>().map_err(|_| anyhow!("not a number: {s:?}"));
        Ok(Point {
            x: num(cols[0])?,
            y: num(cols[1])?,
            weight: cols.get(2).map(|&w| num(w)).transpose()?,
        })
    }
}

impl<T> Iterator for PointParser<T>
where
    T: Iterator<Item = std::io::Result<String>>,
{
    type Item = Result<Point>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.it.by_ref() {
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e).with_context(|| format!("failed to read line {}", self.line_no))),
            };
            let body = line.split('#').next().unwrap_or("").trim();
            if body.is_empty() {
                continue;
            }
            let line_no = self.line_no;
            return Some(Self::parse_row(body).with_context(|| format!("malformed row at line {line_no}")));
        }
        None
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Points {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

impl Points {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn from_parser<T>(parser: PointParser<T>) -> Result<Points>
    where
        T: Iterator<Item = std::io::Result<String>>,
    {
        let mut points = Points::default();
        let mut weights = Vec::new();
        let mut weighted_rows = 0;
        for p in parser {
            let p = p?;
            points.x.push(p.x);
            points.y.push(p.y);
            if let Some(w) = p.weight {
                weights.push(w);
                weighted_rows += 1;
            }
        }
        if weighted_rows > 0 && weighted_rows != points.len() {
            bail!("{} of {} rows carry a weight; give one on every row or none", weighted_rows, points.len());
        }
        if weighted_rows > 0 {
            points.weights = Some(weights);
        }
        Ok(points)
    }
}
