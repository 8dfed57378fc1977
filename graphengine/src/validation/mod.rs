//! Document validation (§4.3): a single stateful visitor over the parsed
//! document, grounded on `original_source/include/Validation.h`'s
//! `ValidateExecutableVisitor` rather than a plugin-per-rule architecture —
//! the rules below are methods on one [`Validator`] that shares a scoped
//! type stack, a fragment-cycle stack, a used-fragment set, and a
//! per-operation variable table, exactly as the original's comment
//! describes its own internal state.

pub mod context;
pub mod value;

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{self, Document, OperationType, Selection, SelectionSet};
use crate::error::{SchemaError, ValidationResult};
use crate::schema::{DirectiveLocation, Schema, TypeDef, TypeRef};
use crate::span::Span;

use context::{ValidateType, ValidationContext};
use value::{visit_argument_value, ValidateArgumentVariant};

#[derive(Clone, Debug)]
struct VariableInfo {
    var_type: ValidateType,
    has_default: bool,
}

type VariableTable = IndexMap<String, VariableInfo>;

/// One field contributing to a response key at a given merge level, used by
/// the field-selection-merging rule (§4.3).
struct MergeCandidate {
    response_key: String,
    field_name: String,
    arguments: Vec<(String, ValidateArgumentVariant)>,
    return_type: ValidateType,
    type_condition: Option<String>,
}

pub fn validate(document: &Document, schema: &Schema) -> ValidationResult {
    let mut validator = Validator::new(document, schema);
    validator.run(document);
    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(validator.errors)
    }
}

struct Validator<'a> {
    ctx: ValidationContext<'a>,
    fragments: IndexMap<&'a str, &'a ast::Fragment>,
    used_fragments: HashSet<String>,
    errors: Vec<SchemaError>,
}

impl<'a> Validator<'a> {
    fn new(document: &'a Document, schema: &'a Schema) -> Self {
        let fragments = document.fragments().map(|f| (f.item.name.item.as_str(), &f.item)).collect();
        Validator { ctx: ValidationContext::new(schema), fragments, used_fragments: HashSet::new(), errors: Vec::new() }
    }

    fn run(&mut self, document: &'a Document) {
        self.check_operation_names(document);
        self.check_fragment_names(document);
        self.check_fragment_cycles(document);

        for fragment in document.fragments() {
            self.validate_fragment_definition(&fragment.item, fragment.span);
        }
        for operation in document.operations() {
            self.validate_operation(&operation.item, operation.span);
        }

        self.check_unused_fragments(document);
    }

    fn check_operation_names(&mut self, document: &Document) {
        let mut seen: IndexMap<&str, Span> = IndexMap::new();
        let mut total = 0;
        let mut has_anonymous = false;
        for op in document.operations() {
            total += 1;
            let name = op.item.name();
            if name.is_empty() {
                has_anonymous = true;
            } else if seen.insert(name, op.span).is_some() {
                self.errors.push(SchemaError::at(format!("there can be only one operation named {name:?}"), op.span));
            }
        }
        if has_anonymous && total > 1 {
            let spans = document.operations().map(|op| op.span).collect();
            self.errors.push(SchemaError::new(
                "an anonymous operation must be the only operation in the document",
                spans,
            ));
        }
    }

    fn check_fragment_names(&mut self, document: &Document) {
        let mut seen: IndexMap<&str, Span> = IndexMap::new();
        for fragment in document.fragments() {
            let name = fragment.item.name.item.as_str();
            if seen.insert(name, fragment.span).is_some() {
                self.errors.push(SchemaError::at(format!("there can be only one fragment named {name:?}"), fragment.span));
            }
        }
    }

    /// DFS over the fragment-spread graph; any fragment reachable from
    /// itself is reported with kind `CyclicFragmentSpread` (§8 scenario 5).
    fn check_fragment_cycles(&mut self, document: &Document) {
        for fragment in document.fragments() {
            let mut stack = vec![fragment.item.name.item.clone()];
            let mut visited = HashSet::new();
            visited.insert(fragment.item.name.item.clone());
            if let Some(cycle_span) = self.find_cycle(&fragment.item.selection_set, &mut stack, &mut visited) {
                self.errors.push(SchemaError::at(
                    format!("CyclicFragmentSpread: fragment {:?} spreads itself", fragment.item.name.item),
                    cycle_span,
                ));
            }
        }
    }

    fn find_cycle(&self, selection_set: &SelectionSet, stack: &mut Vec<String>, visited: &mut HashSet<String>) -> Option<Span> {
        for selection in selection_set {
            match selection {
                Selection::FragmentSpread(spread) => {
                    let name = &spread.item.name.item;
                    if stack.contains(name) {
                        return Some(spread.span);
                    }
                    if let Some(fragment) = self.fragments.get(name.as_str()) {
                        if visited.insert(name.clone()) {
                            stack.push(name.clone());
                            let found = self.find_cycle(&fragment.selection_set, stack, visited);
                            stack.pop();
                            if found.is_some() {
                                return found;
                            }
                        }
                    }
                }
                Selection::InlineFragment(inline) => {
                    if let Some(found) = self.find_cycle(&inline.item.selection_set, stack, visited) {
                        return Some(found);
                    }
                }
                Selection::Field(field) => {
                    if let Some(nested) = &field.item.selection_set {
                        if let Some(found) = self.find_cycle(nested, stack, visited) {
                            return Some(found);
                        }
                    }
                }
            }
        }
        None
    }

    fn check_unused_fragments(&mut self, document: &Document) {
        for fragment in document.fragments() {
            let name = &fragment.item.name.item;
            if !self.used_fragments.contains(name) {
                self.errors.push(SchemaError::at(format!("fragment {name:?} is never used"), fragment.span));
            }
        }
    }

    fn validate_fragment_definition(&mut self, fragment: &ast::Fragment, _span: Span) {
        let condition_name = &fragment.type_condition.item;
        match self.ctx.lookup(condition_name) {
            Some(t) if t.is_composite() => {
                let mut variables = VariableTable::new();
                let mut merge = Vec::new();
                self.validate_selection_set(&fragment.selection_set, &t, &mut variables, &mut merge);
                self.check_merge_conflicts(merge);
            }
            Some(_) => self.errors.push(SchemaError::at(
                format!("fragment {:?} cannot condition on non-composite type {condition_name:?}", fragment.name.item),
                fragment.type_condition.span,
            )),
            None => self.errors.push(SchemaError::at(
                format!("unknown type {condition_name:?} in fragment type condition"),
                fragment.type_condition.span,
            )),
        }
    }

    fn validate_operation(&mut self, operation: &ast::Operation, span: Span) {
        let Some(root_ref) = self.root_type_for(operation.operation_type) else {
            self.errors.push(SchemaError::at(
                format!("the schema does not support the {} operation", operation.operation_type.as_str()),
                span,
            ));
            return;
        };
        let root_type = self.ctx.validate_type_of(root_ref);

        let mut variables = VariableTable::new();
        for def in operation.variable_definitions.iter() {
            match self.ctx.resolve_ast_type(&def.var_type.item) {
                Some(type_ref) => {
                    let var_type = self.ctx.validate_type_of(type_ref);
                    if var_type.is_non_null() && def.default_value.is_none() {
                        // A caller-supplied value is still legal; this is checked again
                        // at `resolve()` time where the actual provided map is known.
                    }
                    variables.insert(def.name.item.clone(), VariableInfo { var_type, has_default: def.default_value.is_some() });
                }
                None => self.errors.push(SchemaError::at(
                    format!("unknown type {:?} on variable ${}", def.var_type.item, def.name.item),
                    def.var_type.span,
                )),
            }
        }

        self.validate_directives(&operation.directives, operation_directive_location(operation.operation_type), &variables, span);

        if operation.operation_type == OperationType::Subscription {
            let root_fields = operation.selection_set.iter().filter(|s| matches!(s, Selection::Field(_))).count();
            if root_fields != 1 {
                self.errors.push(SchemaError::at(
                    "a subscription operation must select exactly one root field",
                    span,
                ));
            }
        }

        let mut merge = Vec::new();
        self.validate_selection_set(&operation.selection_set, &root_type, &mut variables, &mut merge);
        self.check_merge_conflicts(merge);
    }

    fn root_type_for(&self, operation_type: OperationType) -> Option<TypeRef> {
        let schema = self.ctx.schema();
        match operation_type {
            OperationType::Query => Some(schema.query_type()),
            OperationType::Mutation => schema.mutation_type(),
            OperationType::Subscription => schema.subscription_type(),
        }
    }

    /// Validates every selection in `selection_set` against `parent_type`,
    /// appending [`MergeCandidate`]s for any `Field` (including ones pulled
    /// in by a fragment spread/inline fragment that doesn't narrow to a
    /// different concrete type) into `merge`.
    fn validate_selection_set(
        &mut self,
        selection_set: &SelectionSet,
        parent_type: &ValidateType,
        variables: &VariableTable,
        merge: &mut Vec<MergeCandidate>,
    ) {
        for selection in selection_set {
            match selection {
                Selection::Field(field) => self.validate_field(&field.item, field.span, parent_type, variables, merge),
                Selection::FragmentSpread(spread) => {
                    self.validate_directives(&spread.item.directives, DirectiveLocation::FragmentSpread, variables, spread.span);
                    let name = spread.item.name.item.clone();
                    self.used_fragments.insert(name.clone());
                    // Copy the `&'a Fragment` out before recursing so the recursive
                    // call (which needs `&mut self`) doesn't conflict with the
                    // immutable borrow of `self.fragments` the lookup would otherwise hold.
                    let fragment: Option<&ast::Fragment> = self.fragments.get(name.as_str()).copied();
                    match fragment {
                        Some(fragment) => {
                            let condition = fragment.type_condition.item.clone();
                            if parent_type.name() == Some(condition.as_str()) {
                                self.validate_selection_set(&fragment.selection_set, parent_type, variables, merge);
                            } else {
                                // Differentiated by type condition on an abstract parent;
                                // validated independently so it doesn't spuriously conflict.
                                if let Some(condition_type) = self.ctx.lookup(&condition) {
                                    let mut nested = Vec::new();
                                    self.validate_selection_set(&fragment.selection_set, &condition_type, variables, &mut nested);
                                    self.check_merge_conflicts(nested);
                                }
                            }
                        }
                        None => self.errors.push(SchemaError::at(format!("unknown fragment {name:?}"), spread.span)),
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.validate_directives(&inline.item.directives, DirectiveLocation::InlineFragment, variables, inline.span);
                    let effective_type = match &inline.item.type_condition {
                        Some(condition) => match self.ctx.lookup(&condition.item) {
                            Some(t) if t.is_composite() => t,
                            Some(_) => {
                                self.errors.push(SchemaError::at(
                                    format!("inline fragment cannot condition on non-composite type {:?}", condition.item),
                                    condition.span,
                                ));
                                continue;
                            }
                            None => {
                                self.errors.push(SchemaError::at(format!("unknown type {:?}", condition.item), condition.span));
                                continue;
                            }
                        },
                        None => parent_type.clone(),
                    };
                    if effective_type == *parent_type {
                        self.validate_selection_set(&inline.item.selection_set, parent_type, variables, merge);
                    } else {
                        let mut nested = Vec::new();
                        self.validate_selection_set(&inline.item.selection_set, &effective_type, variables, &mut nested);
                        self.check_merge_conflicts(nested);
                    }
                }
            }
        }
    }

    fn validate_field(
        &mut self,
        field: &ast::Field,
        span: Span,
        parent_type: &ValidateType,
        variables: &VariableTable,
        merge: &mut Vec<MergeCandidate>,
    ) {
        self.validate_directives(&field.directives, DirectiveLocation::Field, variables, span);

        if field.name.item == "__typename" {
            merge.push(MergeCandidate {
                response_key: field.response_key().to_owned(),
                field_name: field.name.item.clone(),
                arguments: Vec::new(),
                return_type: ValidateType::NonNull(Box::new(ValidateType::Scalar("String".to_owned()))),
                type_condition: parent_type.name().map(str::to_owned),
            });
            return;
        }

        let Some(field_def) = self.lookup_field(parent_type, &field.name.item) else {
            self.errors.push(SchemaError::at(
                format!("unknown field {:?} on type {}", field.name.item, parent_type),
                span,
            ));
            return;
        };

        self.validate_arguments(&field.arguments, &field_def.args, variables, span);

        let return_type = self.ctx.validate_type_of(field_def.return_type);
        let inner = return_type.nullable();

        match (&field.selection_set, inner.is_leaf()) {
            (Some(_), true) => self.errors.push(SchemaError::at(
                format!("field {:?} returns a leaf type and cannot have a sub-selection", field.name.item),
                span,
            )),
            (None, false) => self.errors.push(SchemaError::at(
                format!("field {:?} returns a composite type and requires a sub-selection", field.name.item),
                span,
            )),
            (Some(selection_set), false) => {
                let mut nested = Vec::new();
                self.validate_selection_set(selection_set, inner, variables, &mut nested);
                self.check_merge_conflicts(nested);
            }
            (None, true) => {}
        }

        merge.push(MergeCandidate {
            response_key: field.response_key().to_owned(),
            field_name: field.name.item.clone(),
            arguments: field.arguments.iter().map(|a| (a.name.item.clone(), visit_argument_value(&a.value.item))).collect(),
            return_type,
            type_condition: parent_type.name().map(str::to_owned),
        });
    }

    fn lookup_field(&self, parent_type: &ValidateType, name: &str) -> Option<crate::schema::Field> {
        let type_ref = self.ctx.type_ref_by_name(parent_type.name()?)?;
        let type_def = self.ctx.schema().type_def(type_ref)?;
        type_def.fields()?.iter().find(|f| f.name == name).cloned()
    }

    fn check_merge_conflicts(&mut self, candidates: Vec<MergeCandidate>) {
        let mut by_key: IndexMap<String, Vec<MergeCandidate>> = IndexMap::new();
        for candidate in candidates {
            by_key.entry(candidate.response_key.clone()).or_default().push(candidate);
        }
        for (response_key, group) in by_key {
            let first = &group[0];
            for other in &group[1..] {
                if first.type_condition != other.type_condition {
                    // Differentiated by concrete type on an abstract parent: legal.
                    continue;
                }
                if first.field_name != other.field_name {
                    self.errors.push(SchemaError::new(
                        format!(
                            "fields selected under response key {response_key:?} must have the same name ({:?} vs {:?})",
                            first.field_name, other.field_name
                        ),
                        Vec::new(),
                    ));
                } else if first.return_type != other.return_type {
                    self.errors.push(SchemaError::new(
                        format!("fields selected under response key {response_key:?} must have the same return type"),
                        Vec::new(),
                    ));
                } else if first.arguments != other.arguments {
                    self.errors.push(SchemaError::new(
                        format!("fields selected under response key {response_key:?} must pass identical arguments"),
                        Vec::new(),
                    ));
                }
            }
        }
    }

    fn validate_directives(&mut self, directives: &ast::Directives, location: DirectiveLocation, variables: &VariableTable, span: Span) {
        for directive in directives.iter() {
            let Some(def) = self.ctx.schema().directive_by_name(&directive.name.item).cloned() else {
                self.errors.push(SchemaError::at(format!("unknown directive @{}", directive.name.item), span));
                continue;
            };
            if !def.locations.contains(&location) {
                self.errors.push(SchemaError::at(
                    format!("directive @{} is not allowed on {}", directive.name.item, location.as_str()),
                    span,
                ));
            }
            self.validate_arguments(&directive.arguments, &def.args, variables, span);
        }
    }

    fn validate_arguments(
        &mut self,
        arguments: &ast::Arguments,
        arg_defs: &[crate::schema::InputValueDef],
        variables: &VariableTable,
        span: Span,
    ) {
        let mut seen = HashSet::new();
        for arg in arguments.iter() {
            if !seen.insert(arg.name.item.as_str()) {
                self.errors.push(SchemaError::at(format!("argument {:?} is specified more than once", arg.name.item), arg.value.span));
                continue;
            }
            match arg_defs.iter().find(|d| d.name == arg.name.item) {
                Some(def) => {
                    let expected = self.ctx.validate_type_of(def.value_type);
                    self.check_value_against_type(&arg.value.item, arg.value.span, &expected, variables);
                }
                None => self.errors.push(SchemaError::at(format!("unknown argument {:?}", arg.name.item), arg.value.span)),
            }
        }
        for def in arg_defs {
            let expected = self.ctx.validate_type_of(def.value_type);
            let provided = arguments.get(&def.name).is_some();
            if expected.is_non_null() && def.default_value.is_none() && !provided {
                self.errors.push(SchemaError::at(format!("missing required argument {:?}", def.name), span));
            }
        }
    }

    /// Checks a literal value (or variable reference) against `expected`:
    /// enum membership, recursive input-object field rules, and variable
    /// type compatibility (§4.3's argument rules, §4.3's input coercion).
    fn check_value_against_type(&mut self, value: &ast::Value, span: Span, expected: &ValidateType, variables: &VariableTable) {
        if let ast::Value::Variable(name) = value {
            match variables.get(name) {
                Some(info) => {
                    let compatible = info.var_type == *expected
                        || (!expected.is_non_null() && info.var_type == ValidateType::NonNull(Box::new(expected.clone())))
                        || (expected.is_non_null() && info.has_default && info.var_type == *expected.nullable());
                    if !compatible {
                        self.errors.push(SchemaError::at(
                            format!("variable ${name} of type {} is not compatible with expected type {expected}", info.var_type),
                            span,
                        ));
                    }
                }
                None => self.errors.push(SchemaError::at(format!("undefined variable ${name}"), span)),
            }
            return;
        }

        if matches!(value, ast::Value::NullValue) {
            if expected.is_non_null() {
                self.errors.push(SchemaError::at(format!("null is not allowed for non-null type {expected}"), span));
            }
            return;
        }

        let expected = expected.nullable();
        match (value, expected) {
            (ast::Value::IntValue(_), ValidateType::Scalar(name)) if matches!(name.as_str(), "Int" | "Float" | "ID") => {}
            (ast::Value::FloatValue(_), ValidateType::Scalar(name)) if name.as_str() == "Float" => {}
            (ast::Value::StringValue(_), ValidateType::Scalar(name)) if matches!(name.as_str(), "String" | "ID") => {}
            (ast::Value::BooleanValue(_), ValidateType::Scalar(name)) if name.as_str() == "Boolean" => {}
            (_, ValidateType::Scalar(_)) => {}
            (ast::Value::EnumValue(name), ValidateType::Enum(enum_name)) => {
                let known = self
                    .ctx
                    .type_ref_by_name(enum_name)
                    .and_then(|r| self.ctx.schema().type_def(r))
                    .map(|def| matches!(def, TypeDef::Enum(e) if e.values.iter().any(|v| &v.name == name)))
                    .unwrap_or(false);
                if !known {
                    self.errors.push(SchemaError::at(format!("unknown enum value {name:?} for type {enum_name:?}"), span));
                }
            }
            (ast::Value::ListValue(items), ValidateType::List(inner)) => {
                for item in items {
                    self.check_value_against_type(&item.item, item.span, inner, variables);
                }
            }
            (other, ValidateType::List(inner)) => {
                // A bare value coerces into a single-element list.
                self.check_value_against_type(other, span, inner, variables);
            }
            (ast::Value::ObjectValue(fields), ValidateType::InputObject(name)) => {
                let input_def = self.ctx.type_ref_by_name(name).and_then(|r| self.ctx.schema().type_def(r)).cloned();
                if let Some(TypeDef::InputObject(input)) = input_def {
                    let mut seen = HashSet::new();
                    for (field_name, field_value) in fields {
                        if !seen.insert(field_name.item.as_str()) {
                            self.errors.push(SchemaError::at(format!("input field {:?} is specified more than once", field_name.item), field_name.span));
                            continue;
                        }
                        match input.fields.iter().find(|f| f.name == field_name.item) {
                            Some(field_def) => {
                                let field_type = self.ctx.validate_type_of(field_def.value_type);
                                self.check_value_against_type(&field_value.item, field_value.span, &field_type, variables);
                            }
                            None => self.errors.push(SchemaError::at(
                                format!("unknown input field {:?} on type {name:?}", field_name.item),
                                field_name.span,
                            )),
                        }
                    }
                    for field_def in &input.fields {
                        let field_type = self.ctx.validate_type_of(field_def.value_type);
                        let provided = fields.iter().any(|(n, _)| n.item == field_def.name);
                        if field_type.is_non_null() && field_def.default_value.is_none() && !provided {
                            self.errors.push(SchemaError::at(format!("missing required input field {:?}", field_def.name), span));
                        }
                    }
                } else {
                    self.errors.push(SchemaError::at(format!("unknown input object type {name:?}"), span));
                }
            }
            _ => self.errors.push(SchemaError::at(format!("value is not compatible with type {expected}"), span)),
        }
    }
}

fn operation_directive_location(operation_type: OperationType) -> DirectiveLocation {
    match operation_type {
        OperationType::Query => DirectiveLocation::Query,
        OperationType::Mutation => DirectiveLocation::Mutation,
        OperationType::Subscription => DirectiveLocation::Subscription,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaBuilder, TypeRef};

    fn build_schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        let string_type = builder.lookup("String").unwrap();
        let task = builder.add_object("Task", None);
        builder
            .add_fields(
                task,
                vec![
                    crate::schema::Field::new("id", string_type),
                    crate::schema::Field::new("title", string_type),
                ],
            )
            .unwrap();
        let query = builder.add_object("Query", None);
        builder.add_fields(query, vec![crate::schema::Field::new("task", task)]).unwrap();
        builder.add_query_type(query);
        builder.build().unwrap()
    }

    fn parse(source: &str) -> Document {
        crate::parser::parse_document_source(source, 0).unwrap()
    }

    #[test]
    fn accepts_a_well_formed_query() {
        let schema = build_schema();
        let document = parse("query { task { id title } }");
        assert!(validate(&document, &schema).is_ok());
    }

    #[test]
    fn rejects_unknown_field() {
        let schema = build_schema();
        let document = parse("query { task { id bogus } }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("unknown field")));
    }

    #[test]
    fn rejects_missing_sub_selection_on_composite_type() {
        let schema = build_schema();
        let document = parse("query { task }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("requires a sub-selection")));
    }

    #[test]
    fn rejects_sub_selection_on_leaf_type() {
        let schema = build_schema();
        let document = parse("query { task { id { x } } }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("leaf type")));
    }

    #[test]
    fn rejects_fragment_cycles() {
        let schema = build_schema();
        let document = parse("fragment A on Task { ...B } fragment B on Task { ...A } query { task { ...A } }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("CyclicFragmentSpread")));
    }

    #[test]
    fn rejects_unused_fragments() {
        let schema = build_schema();
        let document = parse("fragment Unused on Task { id } query { task { id } }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("never used")));
    }

    #[test]
    fn rejects_conflicting_merged_fields() {
        let schema = build_schema();
        let document = parse("query { task { a: id a: title } }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("same name")));
    }

    #[test]
    fn rejects_duplicate_operation_names() {
        let schema = build_schema();
        let document = parse("query A { task { id } } query A { task { title } }");
        let errors = validate(&document, &schema).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("only one operation")));
    }

    #[test]
    fn lookup_field_returns_cloned_definition() {
        let schema = build_schema();
        let query_ref: TypeRef = schema.query_type();
        let ctx = ValidationContext::new(&schema);
        let query_type = ctx.validate_type_of(query_ref);
        let validator = Validator { ctx, fragments: IndexMap::new(), used_fragments: HashSet::new(), errors: Vec::new() };
        assert!(validator.lookup_field(&query_type, "task").is_some());
    }
}
