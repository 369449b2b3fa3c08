//! Known PromQL functions and their arities.

/// Signature of a built-in function, as far as the parser checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Function {
    pub name: &'static str,
    /// Number of declared parameters.
    pub params: usize,
    /// `0`: exactly `params` arguments. `n > 0`: the last parameter is
    /// optional and may repeat up to `n` times. `-1`: unbounded repetition.
    pub variadic: i8,
    pub experimental: bool,
}

impl Function {
    const fn new(name: &'static str, params: usize, variadic: i8) -> Self {
        Function {
            name,
            params,
            variadic,
            experimental: false,
        }
    }

    const fn experimental(mut self) -> Self {
        self.experimental = true;
        self
    }

    pub fn min_args(&self) -> usize {
        if self.variadic == 0 {
            self.params
        } else {
            self.params.saturating_sub(1)
        }
    }

    /// `None` when the argument list is unbounded.
    pub fn max_args(&self) -> Option<usize> {
        match self.variadic {
            0 => Some(self.params),
            n if n > 0 => Some(self.params.saturating_sub(1) + n as usize),
            _ => None,
        }
    }

    /// Checks an argument count, returning the parse error message on
    /// mismatch.
    pub fn check_arity(&self, got: usize) -> Result<(), String> {
        let name = self.name;
        if self.variadic == 0 {
            if got != self.params {
                return Err(format!(
                    "expected {} argument(s) in call to {name:?}, got {got}",
                    self.params
                ));
            }
            return Ok(());
        }
        let min = self.min_args();
        if got < min {
            return Err(format!(
                "expected at least {min} argument(s) in call to {name:?}, got {got}"
            ));
        }
        if let Some(max) = self.max_args().filter(|max| got > *max) {
            return Err(format!(
                "expected at most {max} argument(s) in call to {name:?}, got {got}"
            ));
        }
        Ok(())
    }
}

const TIME_DEPENDENT: &[&str] = &[
    "days_in_month",
    "day_of_month",
    "day_of_week",
    "day_of_year",
    "hour",
    "minute",
    "month",
    "predict_linear",
    "time",
    "timestamp",
    "year",
];

static FUNCTIONS: &[Function] = &[
    Function::new("abs", 1, 0),
    Function::new("absent", 1, 0),
    Function::new("absent_over_time", 1, 0),
    Function::new("acos", 1, 0),
    Function::new("acosh", 1, 0),
    Function::new("asin", 1, 0),
    Function::new("asinh", 1, 0),
    Function::new("atan", 1, 0),
    Function::new("atanh", 1, 0),
    Function::new("avg_over_time", 1, 0),
    Function::new("ceil", 1, 0),
    Function::new("changes", 1, 0),
    Function::new("clamp", 3, 0),
    Function::new("clamp_max", 2, 0),
    Function::new("clamp_min", 2, 0),
    Function::new("cos", 1, 0),
    Function::new("cosh", 1, 0),
    Function::new("count_over_time", 1, 0),
    Function::new("days_in_month", 1, 1),
    Function::new("day_of_month", 1, 1),
    Function::new("day_of_week", 1, 1),
    Function::new("day_of_year", 1, 1),
    Function::new("deg", 1, 0),
    Function::new("delta", 1, 0),
    Function::new("deriv", 1, 0),
    Function::new("double_exponential_smoothing", 3, 0).experimental(),
    Function::new("exp", 1, 0),
    Function::new("floor", 1, 0),
    Function::new("histogram_avg", 1, 0),
    Function::new("histogram_count", 1, 0),
    Function::new("histogram_fraction", 3, 0),
    Function::new("histogram_quantile", 2, 0),
    Function::new("histogram_stddev", 1, 0),
    Function::new("histogram_stdvar", 1, 0),
    Function::new("histogram_sum", 1, 0),
    Function::new("hour", 1, 1),
    Function::new("idelta", 1, 0),
    Function::new("increase", 1, 0),
    Function::new("info", 2, 1).experimental(),
    Function::new("irate", 1, 0),
    Function::new("label_join", 4, -1),
    Function::new("label_replace", 5, 0),
    Function::new("last_over_time", 1, 0),
    Function::new("ln", 1, 0),
    Function::new("log10", 1, 0),
    Function::new("log2", 1, 0),
    Function::new("mad_over_time", 1, 0).experimental(),
    Function::new("max_over_time", 1, 0),
    Function::new("min_over_time", 1, 0),
    Function::new("minute", 1, 1),
    Function::new("month", 1, 1),
    Function::new("pi", 0, 0),
    Function::new("predict_linear", 2, 0),
    Function::new("present_over_time", 1, 0),
    Function::new("quantile_over_time", 2, 0),
    Function::new("rad", 1, 0),
    Function::new("rate", 1, 0),
    Function::new("resets", 1, 0),
    Function::new("round", 2, 1),
    Function::new("scalar", 1, 0),
    Function::new("sgn", 1, 0),
    Function::new("sin", 1, 0),
    Function::new("sinh", 1, 0),
    Function::new("sort", 1, 0),
    Function::new("sort_by_label", 2, -1).experimental(),
    Function::new("sort_by_label_desc", 2, -1).experimental(),
    Function::new("sort_desc", 1, 0),
    Function::new("sqrt", 1, 0),
    Function::new("stddev_over_time", 1, 0),
    Function::new("stdvar_over_time", 1, 0),
    Function::new("sum_over_time", 1, 0),
    Function::new("tan", 1, 0),
    Function::new("tanh", 1, 0),
    Function::new("time", 0, 0),
    Function::new("timestamp", 1, 0),
    Function::new("vector", 1, 0),
    Function::new("year", 1, 1),
];

/// Looks up a function by its exact (case-sensitive) name.
pub fn lookup(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Functions whose result depends on the evaluation time even when all
/// inputs are pinned with `@`.
pub fn is_time_dependent(name: &str) -> bool {
    TIME_DEPENDENT.contains(&name)
}
