//! Directive bookkeeping for field resolution: `@skip`/`@include` evaluation
//! plus the directive-propagation rule from `resolve()`'s pipeline (§4.5):
//! each resolver observes the directives attached at every enclosing level
//! (operation, fragment definition, fragment spread, inline fragment, field),
//! with distinct merge rules for each.

use indexmap::IndexMap;

use crate::ast::{self, Value};
use crate::error::{ExecutionError, RequestError};
use crate::value_visitor::Variables;

pub type DirectiveSet = IndexMap<String, ast::Directive>;

/// The directive sets visible to a resolver, rebuilt at each nesting level
/// per the propagation rule.
#[derive(Clone, Debug, Default)]
pub struct DirectiveState {
    pub operation: DirectiveSet,
    pub fragment_definition: DirectiveSet,
    pub fragment_spread: DirectiveSet,
    pub inline_fragment: DirectiveSet,
    pub field: DirectiveSet,
}

impl DirectiveState {
    /// The state a field's own children selection set starts from: the
    /// fragment-definition and fragment-spread sets reset to empty, the
    /// inline-fragment set survives until an inner inline fragment
    /// overwrites an entry, the field set is cleared for the new level.
    pub fn descend(&self) -> DirectiveState {
        DirectiveState {
            operation: self.operation.clone(),
            fragment_definition: DirectiveSet::new(),
            fragment_spread: DirectiveSet::new(),
            inline_fragment: self.inline_fragment.clone(),
            field: DirectiveSet::new(),
        }
    }

    pub fn with_field(&self, directives: &ast::Directives) -> DirectiveState {
        let mut state = self.clone();
        state.field = to_set(directives);
        state
    }

    /// Outer-most wins: an entry already present (from an enclosing fragment
    /// definition) is kept rather than replaced.
    pub fn merge_fragment_definition(&self, directives: &ast::Directives) -> DirectiveState {
        let mut state = self.clone();
        merge_outer_wins(&mut state.fragment_definition, directives);
        state
    }

    pub fn merge_fragment_spread(&self, directives: &ast::Directives) -> DirectiveState {
        let mut state = self.clone();
        merge_outer_wins(&mut state.fragment_spread, directives);
        state
    }

    /// Inner-most wins: a nested inline fragment's directive overrides the
    /// same-named directive from an enclosing one.
    pub fn merge_inline_fragment(&self, directives: &ast::Directives) -> DirectiveState {
        let mut state = self.clone();
        for directive in directives.iter() {
            state.inline_fragment.insert(directive.name.item.clone(), directive.clone());
        }
        state
    }
}

fn to_set(directives: &ast::Directives) -> DirectiveSet {
    directives.iter().map(|d| (d.name.item.clone(), d.clone())).collect()
}

fn merge_outer_wins(set: &mut DirectiveSet, directives: &ast::Directives) {
    for directive in directives.iter() {
        set.entry(directive.name.item.clone()).or_insert_with(|| directive.clone());
    }
}

/// Evaluates `@skip`/`@include` on a selection. Returns `Ok(true)` if the
/// selection should be skipped. Any directive other than these two is
/// ignored here (the validator rejects unknown directives before execution
/// ever runs); a malformed `if` argument on skip/include is a request error.
pub fn should_skip(directives: &ast::Directives, variables: &Variables) -> Result<bool, RequestError> {
    let mut skip = false;
    let mut include = true;

    if let Some(directive) = directives.get("skip") {
        skip = eval_if_argument(directive, variables)?;
    }
    if let Some(directive) = directives.get("include") {
        include = eval_if_argument(directive, variables)?;
    }
    Ok(skip || !include)
}

fn eval_if_argument(directive: &ast::Directive, variables: &Variables) -> Result<bool, RequestError> {
    let arg = directive
        .arguments
        .get("if")
        .ok_or_else(|| RequestError::schema_exception(format!("@{} is missing its `if` argument", directive.name.item)))?;
    let value = crate::value_visitor::visit_value(&arg.item, arg.span, variables)
        .map_err(|err| RequestError::schema_exception(err.to_string()))?;
    value.as_bool().ok_or_else(|| {
        RequestError::schema_exception(format!("@{}(if:) must be a Boolean", directive.name.item))
    })
}

/// Converts a `DirectiveState` failure into a field-level error when
/// resolution needs to keep going for sibling fields.
pub fn field_level(err: RequestError) -> ExecutionError {
    ExecutionError::new(err.to_string(), crate::span::Span::unlocated())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Spanning;

    fn directives_with(name: &str, if_value: bool) -> ast::Directives {
        ast::Directives {
            items: vec![Spanning::unlocated(ast::Directive {
                name: Spanning::unlocated(name.to_owned()),
                arguments: ast::Arguments {
                    items: vec![ast::Argument {
                        name: Spanning::unlocated("if".to_owned()),
                        value: Spanning::unlocated(Value::BooleanValue(if_value)),
                    }],
                },
            })],
        }
    }

    #[test]
    fn skip_true_skips_selection() {
        let directives = directives_with("skip", true);
        assert!(should_skip(&directives, &Variables::new()).unwrap());
    }

    #[test]
    fn include_false_skips_selection() {
        let directives = directives_with("include", false);
        assert!(should_skip(&directives, &Variables::new()).unwrap());
    }

    #[test]
    fn descend_resets_fragment_sets_but_keeps_inline_fragment() {
        let mut state = DirectiveState::default();
        state = state.merge_fragment_definition(&directives_with("a", true));
        state = state.merge_inline_fragment(&directives_with("b", true));

        let nested = state.descend();
        assert!(nested.fragment_definition.is_empty());
        assert!(nested.fragment_spread.is_empty());
        assert!(nested.inline_fragment.contains_key("b"));
    }

    #[test]
    fn fragment_definition_merge_is_outer_most_wins() {
        let state = DirectiveState::default();
        let state = state.merge_fragment_definition(&directives_with("tag", true));
        let state = state.merge_fragment_definition(&directives_with("tag", false));
        let directive = state.fragment_definition.get("tag").unwrap();
        let arg = directive.arguments.get("if").unwrap();
        assert_eq!(arg.item, Value::BooleanValue(true));
    }

    #[test]
    fn inline_fragment_merge_is_inner_most_wins() {
        let state = DirectiveState::default();
        let state = state.merge_inline_fragment(&directives_with("tag", true));
        let state = state.merge_inline_fragment(&directives_with("tag", false));
        let directive = state.inline_fragment.get("tag").unwrap();
        let arg = directive.arguments.get("if").unwrap();
        assert_eq!(arg.item, Value::BooleanValue(false));
    }
}
