//! Variable reference extraction

use crate::executor::types::Node;

/// Names of every `$(...)` reference, in pre-order, duplicates kept
///
/// Callers that want a set must dedupe themselves.
pub fn find_referenced_variables(node: &Node) -> Vec<String> {
    let mut names = Vec::new();
    collect(node, &mut names);
    names
}

fn collect(node: &Node, names: &mut Vec<String>) {
    match node {
        Node::VariableRef { name } => names.push(name.clone()),

        Node::Literal { .. } | Node::Identifier { .. } => {}

        Node::Unary { argument, .. }
        | Node::Update { argument, .. }
        | Node::Return { argument } => collect(argument, names),

        Node::Binary { left, right, .. } | Node::Assignment { left, right, .. } => {
            collect(left, names);
            collect(right, names);
        }

        Node::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect(test, names);
            collect(consequent, names);
            collect(alternate, names);
        }

        Node::Call { arguments, .. } => {
            for argument in arguments {
                collect(argument, names);
            }
        }

        Node::TemplateLiteral { expressions, .. } => {
            for expression in expressions {
                collect(expression, names);
            }
        }

        Node::Compound { body } => {
            for statement in body {
                collect(statement, names);
            }
        }

        Node::Array { elements } => {
            for element in elements.iter().flatten() {
                collect(element, names);
            }
        }

        Node::Object { properties } => {
            for property in properties {
                collect(&property.key, names);
                collect(&property.value, names);
            }
        }

        Node::Member {
            object, property, ..
        } => {
            collect(object, names);
            collect(property, names);
        }
    }
}
