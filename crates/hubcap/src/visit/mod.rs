//! visitor pattern helpers
mod visit_variables;
pub use visit_variables::VisitVariables;

/// Visitor that looks at its subjects
pub trait Visit<T> {
    fn visit(&mut self, value: &T);
}

// blanket impl for FnMut
impl<T, F> Visit<T> for F
where
    F: FnMut(&T),
{
    fn visit(&mut self, value: &T) {
        self(value)
    }
}
