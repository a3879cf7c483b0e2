//! AST normalization
//!
//! Rewrites the raw parse tree into the shape the resolver expects:
//! - `undefined` identifiers become literals
//! - `Binary` assignments become `Assignment` nodes
//! - identifier object keys become string literals
//! - `return(x)` calls at statement level become `Return`
//! - `$(var)` followed by a one-element array becomes a member access
//! - a bare `return` swallows the statement after it
//! - single-statement compounds are flattened

use crate::executor::types::{BinaryOp, Node, Property, Value};

/// Normalize a raw parse tree
pub fn fixup_expression(node: Node) -> Node {
    call_to_return(fixup_node(node))
}

fn fixup_box(node: Box<Node>) -> Box<Node> {
    Box::new(fixup_node(*node))
}

fn fixup_node(node: Node) -> Node {
    match node {
        Node::Identifier { name } if name == "undefined" => Node::Literal {
            value: Value::Undefined,
            raw: name,
        },

        Node::Literal { .. } | Node::Identifier { .. } | Node::VariableRef { .. } => node,

        Node::Unary {
            operator,
            argument,
            prefix,
        } => Node::Unary {
            operator,
            argument: fixup_box(argument),
            prefix,
        },

        Node::Binary {
            operator: BinaryOp::Assign(operator),
            left,
            right,
        } => Node::Assignment {
            operator,
            left: fixup_box(left),
            right: fixup_box(right),
        },

        Node::Binary {
            operator,
            left,
            right,
        } => Node::Binary {
            operator,
            left: fixup_box(left),
            right: fixup_box(right),
        },

        Node::Conditional {
            test,
            consequent,
            alternate,
        } => Node::Conditional {
            test: fixup_box(test),
            consequent: fixup_box(consequent),
            alternate: fixup_box(alternate),
        },

        Node::Call { callee, arguments } => Node::Call {
            callee,
            arguments: arguments.into_iter().map(fixup_node).collect(),
        },

        Node::TemplateLiteral {
            quasis,
            expressions,
        } => Node::TemplateLiteral {
            quasis,
            expressions: expressions.into_iter().map(fixup_node).collect(),
        },

        Node::Compound { body } => fixup_compound(body),

        Node::Array { elements } => Node::Array {
            elements: elements
                .into_iter()
                .map(|element| element.map(fixup_node))
                .collect(),
        },

        Node::Object { properties } => Node::Object {
            properties: properties
                .into_iter()
                .map(|Property { key, value, computed }| Property {
                    key: match key {
                        Node::Identifier { name } if !computed => Node::string(name),
                        other => fixup_node(other),
                    },
                    value: fixup_node(value),
                    computed,
                })
                .collect(),
        },

        Node::Member {
            object,
            property,
            computed,
        } => Node::Member {
            object: fixup_box(object),
            // `a.b` names a property, it does not read a local
            property: if computed {
                fixup_box(property)
            } else {
                property
            },
            computed,
        },

        Node::Return { argument } => Node::Return {
            argument: fixup_box(argument),
        },

        Node::Assignment {
            operator,
            left,
            right,
        } => Node::Assignment {
            operator,
            left: fixup_box(left),
            right: fixup_box(right),
        },

        Node::Update {
            operator,
            argument,
            prefix,
        } => Node::Update {
            operator,
            argument: fixup_box(argument),
            prefix,
        },
    }
}

/// `return(x)` parses as a call; at statement level it is a return
fn call_to_return(node: Node) -> Node {
    match node {
        Node::Call {
            callee,
            mut arguments,
        } if callee == "return" && arguments.len() == 1 => Node::Return {
            argument: Box::new(arguments.remove(0)),
        },
        other => other,
    }
}

/// Element of a one-element array literal
fn single_element(node: Node) -> Option<Node> {
    match node {
        Node::Array { elements } if elements.len() == 1 => elements.into_iter().next().flatten(),
        _ => None,
    }
}

fn is_single_element_array(node: &Node) -> bool {
    matches!(node, Node::Array { elements } if elements.len() == 1 && elements[0].is_some())
}

fn fixup_compound(body: Vec<Node>) -> Node {
    // statement-level rewrites and `$(var)[index]` folding
    let mut statements = Vec::with_capacity(body.len());
    let mut iter = body.into_iter().map(fixup_node).map(call_to_return).peekable();
    while let Some(statement) = iter.next() {
        if matches!(statement, Node::VariableRef { .. }) {
            if let Some(index) = iter.next_if(is_single_element_array).and_then(single_element) {
                statements.push(Node::Member {
                    object: Box::new(statement),
                    property: Box::new(index),
                    computed: true,
                });
                continue;
            }
        }
        statements.push(statement);
    }

    // bare `return` takes the following statement as its argument
    let mut folded = Vec::with_capacity(statements.len());
    let mut iter = statements.into_iter();
    while let Some(statement) = iter.next() {
        if statement.is_identifier("return") {
            if let Some(argument) = iter.next() {
                folded.push(Node::Return {
                    argument: Box::new(argument),
                });
                continue;
            }
        }
        folded.push(statement);
    }

    if folded.len() == 1 {
        folded.remove(0)
    } else {
        Node::Compound { body: folded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::{AssignOp, UpdateOp};

    fn var(name: &str) -> Node {
        Node::VariableRef {
            name: name.to_string(),
        }
    }

    fn array(elements: Vec<Node>) -> Node {
        Node::Array {
            elements: elements.into_iter().map(Some).collect(),
        }
    }

    #[test]
    fn test_undefined_identifier_becomes_literal() {
        let fixed = fixup_expression(Node::identifier("undefined"));
        assert_eq!(
            fixed,
            Node::Literal {
                value: Value::Undefined,
                raw: "undefined".to_string()
            }
        );
    }

    #[test]
    fn test_root_return_call() {
        let fixed = fixup_expression(Node::Call {
            callee: "return".to_string(),
            arguments: vec![Node::number(1.0)],
        });
        assert_eq!(
            fixed,
            Node::Return {
                argument: Box::new(Node::number(1.0))
            }
        );
    }

    #[test]
    fn test_nested_return_call_is_left_alone() {
        let call = Node::Call {
            callee: "return".to_string(),
            arguments: vec![Node::number(1.0)],
        };
        let fixed = fixup_expression(Node::Unary {
            operator: crate::executor::types::UnaryOp::Neg,
            argument: Box::new(call.clone()),
            prefix: true,
        });
        let Node::Unary { argument, .. } = fixed else {
            panic!("expected unary, got {:?}", fixed);
        };
        assert_eq!(*argument, call);
    }

    #[test]
    fn test_assignment_reclassified() {
        let fixed = fixup_expression(Node::Binary {
            operator: BinaryOp::Assign(AssignOp::Add),
            left: Box::new(Node::identifier("a")),
            right: Box::new(Node::number(2.0)),
        });
        assert_eq!(
            fixed,
            Node::Assignment {
                operator: AssignOp::Add,
                left: Box::new(Node::identifier("a")),
                right: Box::new(Node::number(2.0)),
            }
        );
    }

    #[test]
    fn test_object_identifier_keys() {
        let fixed = fixup_expression(Node::Object {
            properties: vec![Property {
                key: Node::identifier("a"),
                value: Node::identifier("undefined"),
                computed: false,
            }],
        });
        let Node::Object { properties } = fixed else {
            panic!("expected object");
        };
        assert_eq!(properties[0].key, Node::string("a"));
        assert!(matches!(
            properties[0].value,
            Node::Literal {
                value: Value::Undefined,
                ..
            }
        ));
    }

    #[test]
    fn test_variable_index_folded() {
        let fixed = fixup_expression(Node::Compound {
            body: vec![var("my:var"), array(vec![Node::number(0.0)])],
        });
        assert_eq!(
            fixed,
            Node::Member {
                object: Box::new(var("my:var")),
                property: Box::new(Node::number(0.0)),
                computed: true,
            }
        );
    }

    #[test]
    fn test_two_element_array_not_folded() {
        let body = vec![
            var("my:var"),
            array(vec![Node::number(0.0), Node::number(1.0)]),
        ];
        let fixed = fixup_expression(Node::Compound { body: body.clone() });
        assert_eq!(fixed, Node::Compound { body });
    }

    #[test]
    fn test_bare_return_folded() {
        let fixed = fixup_expression(Node::Compound {
            body: vec![
                Node::identifier("return"),
                Node::number(1.0),
                Node::identifier("return"),
                Node::number(2.0),
            ],
        });
        assert_eq!(
            fixed,
            Node::Compound {
                body: vec![
                    Node::Return {
                        argument: Box::new(Node::number(1.0))
                    },
                    Node::Return {
                        argument: Box::new(Node::number(2.0))
                    },
                ]
            }
        );
    }

    #[test]
    fn test_bare_return_takes_folded_member() {
        let fixed = fixup_expression(Node::Compound {
            body: vec![
                Node::identifier("return"),
                var("a:b"),
                array(vec![Node::number(2.0)]),
            ],
        });
        assert_eq!(
            fixed,
            Node::Return {
                argument: Box::new(Node::Member {
                    object: Box::new(var("a:b")),
                    property: Box::new(Node::number(2.0)),
                    computed: true,
                })
            }
        );
    }

    #[test]
    fn test_nested_compound_flattened() {
        let fixed = fixup_expression(Node::Array {
            elements: vec![Some(Node::Compound {
                body: vec![Node::Update {
                    operator: UpdateOp::Increment,
                    argument: Box::new(Node::identifier("a")),
                    prefix: true,
                }],
            })],
        });
        assert_eq!(
            fixed,
            Node::Array {
                elements: vec![Some(Node::Update {
                    operator: UpdateOp::Increment,
                    argument: Box::new(Node::identifier("a")),
                    prefix: true,
                })]
            }
        );
    }
}
