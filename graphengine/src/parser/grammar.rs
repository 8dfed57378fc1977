//! Recursive-descent parser driving [`super::lexer::Lexer`] and projecting
//! directly into the typed [`crate::ast`] tree, discarding punctuation and
//! whitespace tokens as it goes rather than building an intermediate
//! untyped parse tree.

use std::iter::Peekable;

use crate::ast::*;
use crate::error::ParseError;
use crate::span::{SourcePosition, Span, Spanning};

use super::lexer::{Lexer, LexerResult, Token};

pub struct Parser<'a> {
    lexer: Peekable<LexerResult<'a>>,
    file_id: u32,
    last_end: SourcePosition,
}

type R<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file_id: u32) -> Self {
        Parser { lexer: Lexer::new(source).peekable(), file_id, last_end: SourcePosition::start() }
    }

    fn span(&self, start: SourcePosition) -> Span {
        Span::new(self.file_id, start, self.last_end)
    }

    fn peek(&mut self) -> R<Option<Token<'a>>> {
        match self.lexer.peek() {
            Some(Ok((_, token, _))) => Ok(Some(token.clone())),
            Some(Err(_)) => {
                let (pos, err) = match self.lexer.next() {
                    Some(Err(e)) => e,
                    _ => unreachable!(),
                };
                Err(ParseError::new(err.to_string(), Span::new(self.file_id, pos, pos)))
            }
            None => Ok(None),
        }
    }

    fn bump(&mut self) -> R<Option<(SourcePosition, Token<'a>, SourcePosition)>> {
        match self.lexer.next() {
            Some(Ok((start, token, end))) => {
                self.last_end = end;
                Ok(Some((start, token, end)))
            }
            Some(Err((pos, err))) => Err(ParseError::new(err.to_string(), Span::new(self.file_id, pos, pos))),
            None => Ok(None),
        }
    }

    fn start_position(&mut self) -> R<SourcePosition> {
        Ok(self.lexer.peek().map(|r| match r {
            Ok((start, _, _)) => *start,
            Err((pos, _)) => *pos,
        }).unwrap_or(self.last_end))
    }

    fn expect(&mut self, expected: &Token<'a>) -> R<()> {
        let start = self.start_position()?;
        match self.bump()? {
            Some((_, ref token, _)) if token == expected => Ok(()),
            Some((_, token, _)) => {
                Err(ParseError::new(format!("expected {expected}, found {token}"), self.span(start)))
            }
            None => Err(ParseError::new(format!("expected {expected}, found end of input"), self.span(start))),
        }
    }

    fn expect_name(&mut self) -> R<Spanning<String>> {
        let start = self.start_position()?;
        match self.bump()? {
            Some((s, Token::Name(name), e)) => Ok(Spanning::new(Span::new(self.file_id, s, e), name.to_owned())),
            Some((_, token, _)) => Err(ParseError::new(format!("expected a name, found {token}"), self.span(start))),
            None => Err(ParseError::new("expected a name, found end of input", self.span(start))),
        }
    }

    fn matches(&mut self, token: &Token<'a>) -> R<bool> {
        Ok(self.peek()?.is_some_and(|t| &t == token))
    }

    fn matches_name(&mut self, name: &str) -> R<bool> {
        Ok(matches!(self.peek()?, Some(Token::Name(n)) if n == name))
    }

    fn consume_if(&mut self, token: &Token<'a>) -> R<bool> {
        if self.matches(token)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn parse_document(&mut self) -> R<Document> {
        let mut definitions = Vec::new();
        while self.peek()?.is_some() {
            definitions.push(self.parse_definition()?);
        }
        Ok(Document { definitions })
    }

    fn parse_definition(&mut self) -> R<Definition> {
        if matches!(self.peek()?, Some(Token::String(_)) | Some(Token::BlockString(_))) {
            let description = self.parse_description()?;
            return self.parse_described_type_definition(description);
        }

        match self.peek()? {
            Some(Token::BraceOpen) => self.parse_operation_definition(None),
            Some(Token::Name("query")) => self.parse_named_operation(OperationType::Query),
            Some(Token::Name("mutation")) => self.parse_named_operation(OperationType::Mutation),
            Some(Token::Name("subscription")) => self.parse_named_operation(OperationType::Subscription),
            Some(Token::Name("fragment")) => self.parse_fragment_definition(),
            Some(Token::Name("schema")) => self.parse_schema_definition(),
            Some(Token::Name("scalar")) => self.parse_scalar_type_definition(None),
            Some(Token::Name("type")) => self.parse_object_type_definition(None),
            Some(Token::Name("interface")) => self.parse_interface_type_definition(None),
            Some(Token::Name("union")) => self.parse_union_type_definition(None),
            Some(Token::Name("enum")) => self.parse_enum_type_definition(None),
            Some(Token::Name("input")) => self.parse_input_object_type_definition(None),
            Some(Token::Name("directive")) => self.parse_directive_definition(None),
            Some(token) => {
                let start = self.start_position()?;
                Err(ParseError::new(format!("unexpected {token} at start of a definition"), self.span(start)))
            }
            None => {
                let start = self.start_position()?;
                Err(ParseError::new("expected a definition, found end of input", self.span(start)))
            }
        }
    }

    /// Dispatches a type-system definition that was preceded by a `Description`
    /// string — every production that accepts one per the June-2018 grammar
    /// except `SchemaDefinition`, which does not.
    fn parse_described_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        match self.peek()? {
            Some(Token::Name("scalar")) => self.parse_scalar_type_definition(description),
            Some(Token::Name("type")) => self.parse_object_type_definition(description),
            Some(Token::Name("interface")) => self.parse_interface_type_definition(description),
            Some(Token::Name("union")) => self.parse_union_type_definition(description),
            Some(Token::Name("enum")) => self.parse_enum_type_definition(description),
            Some(Token::Name("input")) => self.parse_input_object_type_definition(description),
            Some(Token::Name("directive")) => self.parse_directive_definition(description),
            Some(token) => {
                let start = self.start_position()?;
                Err(ParseError::new(format!("unexpected {token} after a description"), self.span(start)))
            }
            None => {
                let start = self.start_position()?;
                Err(ParseError::new("expected a type definition after a description, found end of input", self.span(start)))
            }
        }
    }

    fn parse_named_operation(&mut self, operation_type: OperationType) -> R<Definition> {
        self.bump()?;
        self.parse_operation_definition(Some(operation_type))
    }

    fn parse_operation_definition(&mut self, operation_type: Option<OperationType>) -> R<Definition> {
        let start = self.start_position()?;
        let operation_type = operation_type.unwrap_or(OperationType::Query);

        let name = if matches!(self.peek()?, Some(Token::Name(_))) { Some(self.expect_name()?) } else { None };

        let variable_definitions = if self.matches(&Token::ParenOpen)? {
            self.parse_variable_definitions()?
        } else {
            VariableDefinitions::default()
        };

        let directives = self.parse_directives()?;
        let selection_set = self.parse_selection_set()?;

        Ok(Definition::Operation(Spanning::new(
            self.span(start),
            Operation { operation_type, name, variable_definitions, directives, selection_set },
        )))
    }

    fn parse_variable_definitions(&mut self) -> R<VariableDefinitions> {
        self.expect(&Token::ParenOpen)?;
        let mut items = Vec::new();
        while !self.matches(&Token::ParenClose)? {
            self.expect(&Token::Dollar)?;
            let name = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let var_type = self.parse_type()?;
            let default_value =
                if self.consume_if(&Token::Equals)? { Some(self.parse_value()?) } else { None };
            items.push(VariableDefinition { name, var_type, default_value });
        }
        self.expect(&Token::ParenClose)?;
        Ok(VariableDefinitions { items })
    }

    fn parse_type(&mut self) -> R<Spanning<Type>> {
        let start = self.start_position()?;
        let inner = if self.consume_if(&Token::BracketOpen)? {
            let element = self.parse_type()?;
            self.expect(&Token::BracketClose)?;
            Type::List(Box::new(element.item))
        } else {
            Type::Named(self.expect_name()?.item)
        };
        let ty = if self.consume_if(&Token::ExclamationMark)? { Type::NonNull(Box::new(inner)) } else { inner };
        Ok(Spanning::new(self.span(start), ty))
    }

    fn parse_directives(&mut self) -> R<Directives> {
        let mut items = Vec::new();
        while self.matches(&Token::At)? {
            let start = self.start_position()?;
            self.bump()?;
            let name = self.expect_name()?;
            let arguments = if self.matches(&Token::ParenOpen)? { self.parse_arguments()? } else { Arguments::default() };
            items.push(Spanning::new(self.span(start), Directive { name, arguments }));
        }
        Ok(Directives { items })
    }

    fn parse_arguments(&mut self) -> R<Arguments> {
        self.expect(&Token::ParenOpen)?;
        let mut items = Vec::new();
        while !self.matches(&Token::ParenClose)? {
            let name = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let value = self.parse_value()?;
            items.push(Argument { name, value });
        }
        self.expect(&Token::ParenClose)?;
        Ok(Arguments { items })
    }

    fn parse_value(&mut self) -> R<Spanning<Value>> {
        let start = self.start_position()?;
        let token = self.bump()?.ok_or_else(|| ParseError::new("expected a value, found end of input", self.span(start)))?.1;
        let value = match token {
            Token::Dollar => Value::Variable(self.expect_name()?.item),
            Token::Int(text) => Value::IntValue(text.to_owned()),
            Token::Float(text) => Value::FloatValue(text.to_owned()),
            Token::String(s) => Value::StringValue(s),
            Token::BlockString(s) => Value::StringValue(s),
            Token::Name("true") => Value::BooleanValue(true),
            Token::Name("false") => Value::BooleanValue(false),
            Token::Name("null") => Value::NullValue,
            Token::Name(n) => Value::EnumValue(n.to_owned()),
            Token::BracketOpen => {
                let mut items = Vec::new();
                while !self.matches(&Token::BracketClose)? {
                    items.push(self.parse_value()?);
                }
                self.expect(&Token::BracketClose)?;
                Value::ListValue(items)
            }
            Token::BraceOpen => {
                let mut fields = Vec::new();
                while !self.matches(&Token::BraceClose)? {
                    let name = self.expect_name()?;
                    self.expect(&Token::Colon)?;
                    let value = self.parse_value()?;
                    fields.push((name, value));
                }
                self.expect(&Token::BraceClose)?;
                Value::ObjectValue(fields)
            }
            other => return Err(ParseError::new(format!("unexpected {other} in value position"), self.span(start))),
        };
        Ok(Spanning::new(self.span(start), value))
    }

    fn parse_selection_set(&mut self) -> R<SelectionSet> {
        self.expect(&Token::BraceOpen)?;
        let mut selections = Vec::new();
        while !self.matches(&Token::BraceClose)? {
            selections.push(self.parse_selection()?);
        }
        self.expect(&Token::BraceClose)?;
        Ok(selections)
    }

    fn parse_selection(&mut self) -> R<Selection> {
        if self.matches(&Token::Ellipsis)? {
            self.parse_fragment_selection()
        } else {
            self.parse_field()
        }
    }

    fn parse_field(&mut self) -> R<Selection> {
        let start = self.start_position()?;
        let first = self.expect_name()?;
        let (alias, name) = if self.consume_if(&Token::Colon)? { (Some(first), self.expect_name()?) } else { (None, first) };

        let arguments = if self.matches(&Token::ParenOpen)? { self.parse_arguments()? } else { Arguments::default() };
        let directives = self.parse_directives()?;
        let selection_set = if self.matches(&Token::BraceOpen)? { Some(self.parse_selection_set()?) } else { None };

        Ok(Selection::Field(Spanning::new(self.span(start), Field { alias, name, arguments, directives, selection_set })))
    }

    fn parse_fragment_selection(&mut self) -> R<Selection> {
        let start = self.start_position()?;
        self.expect(&Token::Ellipsis)?;

        if self.matches_name("on")? {
            self.bump()?;
            let type_condition = Some(self.expect_name()?);
            let directives = self.parse_directives()?;
            let selection_set = self.parse_selection_set()?;
            return Ok(Selection::InlineFragment(Spanning::new(
                self.span(start),
                InlineFragment { type_condition, directives, selection_set },
            )));
        }

        if self.matches(&Token::BraceOpen)? || self.matches(&Token::At)? {
            let type_condition = None;
            let directives = self.parse_directives()?;
            let selection_set = self.parse_selection_set()?;
            return Ok(Selection::InlineFragment(Spanning::new(
                self.span(start),
                InlineFragment { type_condition, directives, selection_set },
            )));
        }

        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        Ok(Selection::FragmentSpread(Spanning::new(self.span(start), FragmentSpread { name, directives })))
    }

    fn parse_fragment_definition(&mut self) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        self.expect_keyword("on")?;
        let type_condition = self.expect_name()?;
        let directives = self.parse_directives()?;
        let selection_set = self.parse_selection_set()?;
        Ok(Definition::Fragment(Spanning::new(
            self.span(start),
            Fragment { name, type_condition, directives, selection_set },
        )))
    }

    fn expect_keyword(&mut self, keyword: &str) -> R<()> {
        let start = self.start_position()?;
        match self.bump()? {
            Some((_, Token::Name(n), _)) if n == keyword => Ok(()),
            _ => Err(ParseError::new(format!("expected keyword \"{keyword}\""), self.span(start))),
        }
    }

    fn parse_description(&mut self) -> R<Option<String>> {
        match self.peek()? {
            Some(Token::String(_)) | Some(Token::BlockString(_)) => match self.bump()?.unwrap().1 {
                Token::String(s) | Token::BlockString(s) => Ok(Some(s)),
                _ => unreachable!(),
            },
            _ => Ok(None),
        }
    }

    fn parse_schema_definition(&mut self) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let directives = self.parse_directives()?;
        self.expect(&Token::BraceOpen)?;
        let (mut query, mut mutation, mut subscription) = (None, None, None);
        while !self.matches(&Token::BraceClose)? {
            let operation = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let root = self.expect_name()?;
            match operation.item.as_str() {
                "query" => query = Some(root),
                "mutation" => mutation = Some(root),
                "subscription" => subscription = Some(root),
                other => {
                    return Err(ParseError::new(format!("unknown root operation type {other:?}"), self.span(start)))
                }
            }
        }
        self.expect(&Token::BraceClose)?;
        Ok(Definition::Schema(Spanning::new(self.span(start), SchemaDefinition { directives, query, mutation, subscription })))
    }

    fn parse_scalar_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        Ok(Definition::Type(Spanning::new(
            self.span(start),
            TypeDefinition::Scalar(ScalarTypeDefinition { name, description, directives }),
        )))
    }

    fn parse_implements_interfaces(&mut self) -> R<Vec<Spanning<String>>> {
        let mut interfaces = Vec::new();
        if self.matches_name("implements")? {
            self.bump()?;
            self.consume_if(&Token::Pipe)?;
            interfaces.push(self.expect_name()?);
            while self.consume_if(&Token::Pipe)? {
                interfaces.push(self.expect_name()?);
            }
        }
        Ok(interfaces)
    }

    fn parse_fields_definition(&mut self) -> R<Vec<FieldDefinition>> {
        let mut fields = Vec::new();
        if self.matches(&Token::BraceOpen)? {
            self.bump()?;
            while !self.matches(&Token::BraceClose)? {
                let description = self.parse_description()?;
                let name = self.expect_name()?;
                let arguments = if self.matches(&Token::ParenOpen)? { self.parse_input_values(Token::ParenOpen, Token::ParenClose)? } else { Vec::new() };
                self.expect(&Token::Colon)?;
                let field_type = self.parse_type()?;
                let directives = self.parse_directives()?;
                fields.push(FieldDefinition { name, description, arguments, field_type, directives });
            }
            self.expect(&Token::BraceClose)?;
        }
        Ok(fields)
    }

    fn parse_input_values(&mut self, open: Token<'a>, close: Token<'a>) -> R<Vec<InputValueDefinition>> {
        self.expect(&open)?;
        let mut values = Vec::new();
        while !self.matches(&close)? {
            let description = self.parse_description()?;
            let name = self.expect_name()?;
            self.expect(&Token::Colon)?;
            let value_type = self.parse_type()?;
            let default_value = if self.consume_if(&Token::Equals)? { Some(self.parse_value()?) } else { None };
            let directives = self.parse_directives()?;
            values.push(InputValueDefinition { name, description, value_type, default_value, directives });
        }
        self.expect(&close)?;
        Ok(values)
    }

    fn parse_object_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        let interfaces = self.parse_implements_interfaces()?;
        let directives = self.parse_directives()?;
        let fields = self.parse_fields_definition()?;
        Ok(Definition::Type(Spanning::new(
            self.span(start),
            TypeDefinition::Object(ObjectTypeDefinition { name, description, interfaces, directives, fields }),
        )))
    }

    fn parse_interface_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        let fields = self.parse_fields_definition()?;
        Ok(Definition::Type(Spanning::new(
            self.span(start),
            TypeDefinition::Interface(InterfaceTypeDefinition { name, description, directives, fields }),
        )))
    }

    fn parse_union_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        let mut members = Vec::new();
        if self.consume_if(&Token::Equals)? {
            self.consume_if(&Token::Pipe)?;
            members.push(self.expect_name()?);
            while self.consume_if(&Token::Pipe)? {
                members.push(self.expect_name()?);
            }
        }
        Ok(Definition::Type(Spanning::new(
            self.span(start),
            TypeDefinition::Union(UnionTypeDefinition { name, description, directives, members }),
        )))
    }

    fn parse_enum_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        let mut values = Vec::new();
        if self.matches(&Token::BraceOpen)? {
            self.bump()?;
            while !self.matches(&Token::BraceClose)? {
                let value_description = self.parse_description()?;
                let value_name = self.expect_name()?;
                let value_directives = self.parse_directives()?;
                values.push(EnumValueDefinition { name: value_name, description: value_description, directives: value_directives });
            }
            self.expect(&Token::BraceClose)?;
        }
        Ok(Definition::Type(Spanning::new(
            self.span(start),
            TypeDefinition::Enum(EnumTypeDefinition { name, description, directives, values }),
        )))
    }

    fn parse_input_object_type_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;
        let fields = if self.matches(&Token::BraceOpen)? {
            self.parse_input_values(Token::BraceOpen, Token::BraceClose)?
        } else {
            Vec::new()
        };
        Ok(Definition::Type(Spanning::new(
            self.span(start),
            TypeDefinition::InputObject(InputObjectTypeDefinition { name, description, directives, fields }),
        )))
    }

    fn parse_directive_definition(&mut self, description: Option<String>) -> R<Definition> {
        let start = self.start_position()?;
        self.bump()?;
        self.expect(&Token::At)?;
        let name = self.expect_name()?;
        let arguments = if self.matches(&Token::ParenOpen)? { self.parse_input_values(Token::ParenOpen, Token::ParenClose)? } else { Vec::new() };
        self.expect_keyword("on")?;
        self.consume_if(&Token::Pipe)?;
        let mut locations = vec![self.expect_name()?];
        while self.consume_if(&Token::Pipe)? {
            locations.push(self.expect_name()?);
        }
        Ok(Definition::Directive(Spanning::new(
            self.span(start),
            DirectiveDefinition { name, description, arguments, locations },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Document {
        Parser::new(source, 0).parse_document().unwrap()
    }

    #[test]
    fn parses_anonymous_query() {
        let doc = parse("{ hero { name } }");
        assert_eq!(doc.definitions.len(), 1);
        match &doc.definitions[0] {
            Definition::Operation(op) => {
                assert_eq!(op.item.operation_type, OperationType::Query);
                assert_eq!(op.item.selection_set.len(), 1);
            }
            _ => panic!("expected operation"),
        }
    }

    #[test]
    fn parses_variables_arguments_and_directives() {
        let doc = parse("query Q($id: ID!) { node(id: $id) @include(if: true) { id } }");
        let op = doc.operations().next().unwrap();
        assert_eq!(op.item.name(), "Q");
        assert_eq!(op.item.variable_definitions.items.len(), 1);
        assert!(op.item.variable_definitions.items[0].var_type.item.is_non_null());
    }

    #[test]
    fn parses_fragment_spread_and_inline_fragment() {
        let doc = parse("{ ...Named ... on T { a } ... { b } }");
        let op = doc.operations().next().unwrap();
        assert_eq!(op.item.selection_set.len(), 3);
        assert!(matches!(op.item.selection_set[0], Selection::FragmentSpread(_)));
        assert!(matches!(op.item.selection_set[1], Selection::InlineFragment(_)));
        assert!(matches!(op.item.selection_set[2], Selection::InlineFragment(_)));
    }

    #[test]
    fn parses_object_type_definition_with_interfaces() {
        let doc = parse("type Task implements Node & HasTitle { id: ID! title: String }");
        let ty = doc.type_definitions().next().unwrap();
        match &ty.item {
            TypeDefinition::Object(obj) => {
                assert_eq!(obj.interfaces.len(), 2);
                assert_eq!(obj.fields.len(), 2);
            }
            _ => panic!("expected object type"),
        }
    }

    #[test]
    fn parses_input_object_default_value() {
        let doc = parse("input CompleteTaskInput { id: ID! isComplete: Boolean = true }");
        let ty = doc.type_definitions().next().unwrap();
        match &ty.item {
            TypeDefinition::InputObject(input) => {
                assert!(input.fields[1].default_value.is_some());
            }
            _ => panic!("expected input object"),
        }
    }

    #[test]
    fn parses_type_level_description() {
        let doc = parse("\"\"\"A unit of work\"\"\" type Task { id: ID! }");
        let ty = doc.type_definitions().next().unwrap();
        match &ty.item {
            TypeDefinition::Object(obj) => assert_eq!(obj.description.as_deref(), Some("A unit of work")),
            _ => panic!("expected object type"),
        }
    }

    #[test]
    fn rejects_malformed_document() {
        let err = Parser::new("{ a(", 0).parse_document().unwrap_err();
        assert!(!err.message.is_empty());
    }
}
