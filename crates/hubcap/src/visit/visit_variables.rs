use super::Visit;
use hcl::{
    expr::{Operation, TraversalOperator, Variable},
    template::{Directive, Element},
    Expression, Template, Traversal,
};

/// Recursively visit all [Variable]s an expression refers to
pub trait VisitVariables {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>);
}

impl VisitVariables for Expression {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>) {
        match self {
            Expression::Variable(variable) => visitor.visit(variable),
            Expression::Traversal(traversal) => traversal.visit_variables(visitor),
            Expression::Array(array) => {
                for expr in array {
                    expr.visit_variables(visitor);
                }
            }
            Expression::Object(object) => {
                for value in object.values() {
                    value.visit_variables(visitor);
                }
            }
            Expression::TemplateExpr(template_expr) => {
                // unparsable templates fail later during evaluation
                if let Ok(template) = Template::from_expr(template_expr) {
                    template.visit_variables(visitor);
                }
            }
            Expression::FuncCall(func_call) => {
                for arg in &func_call.args {
                    arg.visit_variables(visitor);
                }
            }
            Expression::Parenthesis(expr) => expr.visit_variables(visitor),
            Expression::Conditional(cond) => {
                cond.cond_expr.visit_variables(visitor);
                cond.true_expr.visit_variables(visitor);
                cond.false_expr.visit_variables(visitor);
            }
            Expression::Operation(operation) => match operation.as_ref() {
                Operation::Binary(binop) => {
                    binop.lhs_expr.visit_variables(visitor);
                    binop.rhs_expr.visit_variables(visitor);
                }
                Operation::Unary(unop) => unop.expr.visit_variables(visitor),
            },
            Expression::ForExpr(forexpr) => {
                forexpr.collection_expr.visit_variables(visitor);
                forexpr
                    .key_expr
                    .iter()
                    .for_each(|e| e.visit_variables(visitor));
                forexpr.value_expr.visit_variables(visitor);
                forexpr
                    .cond_expr
                    .iter()
                    .for_each(|e| e.visit_variables(visitor));
            }
            _ => {}
        }
    }
}

impl VisitVariables for Traversal {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>) {
        self.expr.visit_variables(visitor);
        for operator in &self.operators {
            if let TraversalOperator::Index(index) = operator {
                index.visit_variables(visitor);
            }
        }
    }
}

impl VisitVariables for Template {
    fn visit_variables(&self, visitor: &mut dyn Visit<Variable>) {
        for element in self.elements() {
            match element {
                Element::Interpolation(interpolation) => {
                    interpolation.expr.visit_variables(visitor);
                }
                Element::Directive(directive) => match directive {
                    Directive::If(ifdir) => {
                        ifdir.cond_expr.visit_variables(visitor);
                        ifdir.true_template.visit_variables(visitor);
                        ifdir
                            .false_template
                            .iter()
                            .for_each(|t| t.visit_variables(visitor));
                    }
                    Directive::For(fordir) => {
                        fordir.collection_expr.visit_variables(visitor);
                        fordir.template.visit_variables(visitor);
                    }
                },
                Element::Literal(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn variables(source: &str) -> Vec<String> {
        let expr: Expression = hcl::parse(&format!("x = {source}"))
            .expect("valid hcl")
            .attributes()
            .next()
            .expect("one attribute")
            .expr
            .clone();

        let mut names = Vec::new();
        expr.visit_variables(&mut |variable: &Variable| names.push(variable.as_str().to_string()));
        names
    }

    #[test]
    fn finds_variables_everywhere() {
        assert_eq!(variables("deploy_to"), ["deploy_to"]);
        assert_eq!(variables("\"${root}/${app}\""), ["root", "app"]);
        assert_eq!(variables("[a, { k = b }]"), ["a", "b"]);
        assert_eq!(variables("flag ? yes.value : no[idx]"), ["flag", "yes", "no", "idx"]);
        assert_eq!(variables("upper(name)"), ["name"]);
    }

    #[test]
    fn literals_have_no_variables() {
        assert!(variables("\"plain\"").is_empty());
        assert!(variables("42").is_empty());
    }
}
