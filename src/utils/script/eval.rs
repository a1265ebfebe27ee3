use std::{collections::HashMap, fmt};

use indexmap::IndexMap;
use log::debug;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrayExpression, ArrayExpressionElement, Argument, AssignmentExpression, AssignmentTarget,
    CallExpression, ChainElement, ComputedMemberExpression, Expression, LogicalExpression,
    ObjectExpression, ObjectPropertyKind, Program, PropertyKey, SimpleAssignmentTarget, Statement,
    StaticMemberExpression, TemplateLiteral, UnaryExpression, UpdateExpression,
    VariableDeclaration, VariableDeclarationKind,
};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{GetSpan, Span};

use super::format::page_source_type;

const MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// Page functions are kept opaque, they are never called.
    Function,
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Builtin {
    EncodeUriComponent,
    DecodeUriComponent,
    String,
    Number,
    ParseInt,
}

impl Builtin {
    fn by_name(name: &str) -> Option<Builtin> {
        match name {
            "encodeURIComponent" => Some(Builtin::EncodeUriComponent),
            "decodeURIComponent" => Some(Builtin::DecodeUriComponent),
            "String" => Some(Builtin::String),
            "Number" => Some(Builtin::Number),
            "parseInt" => Some(Builtin::ParseInt),
            _ => None,
        }
    }

    fn apply(self, args: &[Value]) -> Value {
        let arg = args.first().cloned().unwrap_or(Value::Undefined);
        match self {
            Builtin::EncodeUriComponent => Value::String(encode_uri_component(&arg.to_string())),
            Builtin::DecodeUriComponent => Value::String(decode_uri_component(&arg.to_string())),
            Builtin::String if args.is_empty() => Value::String(String::new()),
            Builtin::String => Value::String(arg.to_string()),
            Builtin::Number if args.is_empty() => Value::Number(0.0),
            Builtin::Number => Value::Number(arg.to_number()),
            Builtin::ParseInt => {
                let radix = match args.get(1).map(Value::to_number) {
                    Some(r) if r >= 2.0 && r <= 36.0 => r as u32,
                    _ => 10,
                };
                Value::Number(parse_int(&arg.to_string(), radix))
            }
        }
    }
}

impl Value {
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function | Value::Builtin(_) => "function",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            _ => f64::NAN,
        }
    }

    fn concatenates(&self) -> bool {
        !matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                let joined: Vec<String> = items
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_string()
                        }
                    })
                    .collect();
                f.write_str(&joined.join(","))
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function | Value::Builtin(_) => f.write_str("function () {}"),
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    Syntax(String),
    Reference(String),
    Type(String),
    Unsupported(String),
    TooDeep,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::Syntax(message) => write!(f, "syntax error: {message}"),
            EvalError::Reference(name) => write!(f, "{name} is not defined"),
            EvalError::Type(message) => write!(f, "type error: {message}"),
            EvalError::Unsupported(what) => write!(f, "unsupported: {what}"),
            EvalError::TooDeep => f.write_str("expression nested too deeply"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Only sees the variables declared by the text it runs.
#[derive(Debug, Default)]
pub struct Sandbox {
    vars: HashMap<String, Value>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Statements the interpreter cannot handle are skipped and the names
    /// they declare are bound to `undefined`.
    pub fn run(&mut self, script: &str) -> Result<(), EvalError> {
        let allocator = Allocator::default();
        let program = parse(&allocator, script)?;
        let mut interpreter = Interpreter::new(script, &mut self.vars);

        for statement in program.body.iter() {
            interpreter.depth = 0;
            if let Err(err) = interpreter.statement(statement) {
                debug!("[sandbox] skipping statement: {err}");
                interpreter.declare_undefined(statement);
            }
        }

        Ok(())
    }

    /// Evaluates a single expression, optionally followed by `;`.
    pub fn evaluate(&mut self, expression: &str) -> Result<Value, EvalError> {
        let expression = expression.trim_end();
        let expression = expression.strip_suffix(';').unwrap_or(expression);
        let source = format!("(\n{expression}\n);");

        let allocator = Allocator::default();
        let program = parse(&allocator, &source)?;
        let wrapped = match program.body.as_slice() {
            [Statement::ExpressionStatement(statement)] => match &statement.expression {
                Expression::ParenthesizedExpression(paren) => Some(&paren.expression),
                _ => None,
            },
            _ => None,
        };
        let Some(expression) = wrapped else {
            return Err(EvalError::Syntax("expected a single expression".into()));
        };

        Interpreter::new(&source, &mut self.vars).expression(expression)
    }
}

fn parse<'a>(allocator: &'a Allocator, source: &'a str) -> Result<Program<'a>, EvalError> {
    let options = ParseOptions {
        preserve_parens: true,
        ..ParseOptions::default()
    };
    let ret = Parser::new(allocator, source, page_source_type())
        .with_options(options)
        .parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .first()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "unrecoverable syntax".into());
        return Err(EvalError::Syntax(message));
    }
    Ok(ret.program)
}

struct Interpreter<'s> {
    source: &'s str,
    vars: &'s mut HashMap<String, Value>,
    depth: usize,
}

impl<'s> Interpreter<'s> {
    fn new(source: &'s str, vars: &'s mut HashMap<String, Value>) -> Self {
        Self {
            source,
            vars,
            depth: 0,
        }
    }

    fn snippet(&self, span: Span) -> String {
        let text = self
            .source
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default();
        text.chars().take(40).collect()
    }

    fn unsupported(&self, what: &str, span: Span) -> EvalError {
        EvalError::Unsupported(format!("{what} `{}`", self.snippet(span)))
    }

    // statements

    fn statement(&mut self, statement: &Statement) -> Result<(), EvalError> {
        match statement {
            Statement::EmptyStatement(_) => Ok(()),
            Statement::VariableDeclaration(declaration) => self.declarations(declaration),
            Statement::ExpressionStatement(statement) => {
                self.expression(&statement.expression)?;
                Ok(())
            }
            Statement::FunctionDeclaration(function) => {
                if let Some(id) = &function.id {
                    self.vars.insert(id.name.to_string(), Value::Function);
                }
                Ok(())
            }
            other => Err(self.unsupported("statement", other.span())),
        }
    }

    fn declarations(&mut self, declaration: &VariableDeclaration) -> Result<(), EvalError> {
        let is_var = matches!(declaration.kind, VariableDeclarationKind::Var);

        for declarator in declaration.declarations.iter() {
            let Some(name) = declarator.id.get_identifier_name() else {
                return Err(self.unsupported("destructuring", declarator.span));
            };
            let value = match &declarator.init {
                Some(init) => self.expression(init)?,
                // `var x;` keeps an earlier value
                None if is_var && self.vars.contains_key(name.as_str()) => continue,
                None => Value::Undefined,
            };
            self.vars.insert(name.to_string(), value);
        }

        Ok(())
    }

    fn declare_undefined(&mut self, statement: &Statement) {
        let Statement::VariableDeclaration(declaration) = statement else {
            return;
        };
        for declarator in declaration.declarations.iter() {
            if let Some(name) = declarator.id.get_identifier_name() {
                self.vars
                    .entry(name.to_string())
                    .or_insert(Value::Undefined);
            }
        }
    }

    // expressions

    fn expression(&mut self, expression: &Expression) -> Result<Value, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let result = self.expression_inner(expression);
        self.depth -= 1;
        result
    }

    fn expression_inner(&mut self, expression: &Expression) -> Result<Value, EvalError> {
        match expression {
            Expression::BooleanLiteral(lit) => Ok(Value::Bool(lit.value)),
            Expression::NullLiteral(_) => Ok(Value::Null),
            Expression::NumericLiteral(lit) => Ok(Value::Number(lit.value)),
            Expression::StringLiteral(lit) => Ok(Value::String(lit.value.to_string())),
            Expression::TemplateLiteral(template) => self.template(template),
            Expression::Identifier(ident) => self.lookup(&ident.name),
            Expression::ParenthesizedExpression(paren) => self.expression(&paren.expression),
            Expression::SequenceExpression(sequence) => {
                let mut last = Value::Undefined;
                for item in sequence.expressions.iter() {
                    last = self.expression(item)?;
                }
                Ok(last)
            }
            Expression::ArrayExpression(array) => self.array(array),
            Expression::ObjectExpression(object) => self.object(object),
            Expression::FunctionExpression(_) | Expression::ArrowFunctionExpression(_) => {
                Ok(Value::Function)
            }
            Expression::UnaryExpression(unary) => self.unary(unary),
            Expression::UpdateExpression(update) => self.update(update),
            Expression::BinaryExpression(binary) => {
                let left = self.expression(&binary.left)?;
                let right = self.expression(&binary.right)?;
                apply_binary(binary.operator.as_str(), &left, &right)
            }
            Expression::LogicalExpression(logical) => self.logical(logical),
            Expression::ConditionalExpression(conditional) => {
                if self.expression(&conditional.test)?.truthy() {
                    self.expression(&conditional.consequent)
                } else {
                    self.expression(&conditional.alternate)
                }
            }
            Expression::AssignmentExpression(assignment) => self.assign(assignment),
            Expression::StaticMemberExpression(member) => {
                Ok(self.static_member(member)?.unwrap_or(Value::Undefined))
            }
            Expression::ComputedMemberExpression(member) => {
                Ok(self.computed_member(member)?.unwrap_or(Value::Undefined))
            }
            Expression::CallExpression(call) => {
                Ok(self.call_expression(call)?.unwrap_or(Value::Undefined))
            }
            Expression::ChainExpression(chain) => {
                let value = match &chain.expression {
                    ChainElement::StaticMemberExpression(member) => self.static_member(member)?,
                    ChainElement::ComputedMemberExpression(member) => {
                        self.computed_member(member)?
                    }
                    ChainElement::CallExpression(call) => self.call_expression(call)?,
                    _ => return Err(self.unsupported("expression", chain.span)),
                };
                Ok(value.unwrap_or(Value::Undefined))
            }
            other => Err(self.unsupported("expression", other.span())),
        }
    }

    fn template(&mut self, template: &TemplateLiteral) -> Result<Value, EvalError> {
        let mut out = String::new();
        for (idx, quasi) in template.quasis.iter().enumerate() {
            let text = quasi.value.cooked.as_ref().unwrap_or(&quasi.value.raw);
            out.push_str(text.as_str());
            if let Some(item) = template.expressions.get(idx) {
                out.push_str(&self.expression(item)?.to_string());
            }
        }
        Ok(Value::String(out))
    }

    fn array(&mut self, array: &ArrayExpression) -> Result<Value, EvalError> {
        let mut items = vec![];
        for element in array.elements.iter() {
            match element {
                ArrayExpressionElement::Elision(_) => items.push(Value::Undefined),
                ArrayExpressionElement::SpreadElement(spread) => {
                    match self.expression(&spread.argument)? {
                        Value::Array(spread) => items.extend(spread),
                        Value::String(s) => {
                            items.extend(s.chars().map(|c| Value::String(c.into())))
                        }
                        other => items.push(other),
                    }
                }
                other => match other.as_expression() {
                    Some(item) => items.push(self.expression(item)?),
                    None => return Err(self.unsupported("array element", array.span)),
                },
            }
        }
        Ok(Value::Array(items))
    }

    fn object(&mut self, object: &ObjectExpression) -> Result<Value, EvalError> {
        let mut map = IndexMap::new();
        for property in object.properties.iter() {
            match property {
                ObjectPropertyKind::ObjectProperty(property) => {
                    let key = self.property_key(&property.key, property.computed)?;
                    let value = self.expression(&property.value)?;
                    map.insert(key, value);
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    if let Value::Object(spread) = self.expression(&spread.argument)? {
                        map.extend(spread);
                    }
                }
            }
        }
        Ok(Value::Object(map))
    }

    fn property_key(&mut self, key: &PropertyKey, computed: bool) -> Result<String, EvalError> {
        if computed {
            return match key.as_expression() {
                Some(expression) => Ok(self.expression(expression)?.to_string()),
                None => Err(self.unsupported("property key", key.span())),
            };
        }
        match key {
            PropertyKey::StaticIdentifier(ident) => Ok(ident.name.to_string()),
            PropertyKey::StringLiteral(lit) => Ok(lit.value.to_string()),
            PropertyKey::NumericLiteral(lit) => Ok(number_to_string(lit.value)),
            other => Err(self.unsupported("property key", other.span())),
        }
    }

    fn unary(&mut self, unary: &UnaryExpression) -> Result<Value, EvalError> {
        let op = unary.operator.as_str();

        if let ("typeof", Expression::Identifier(ident)) = (op, &unary.argument) {
            let type_of = match self.lookup(&ident.name) {
                Ok(value) => value.type_of(),
                Err(EvalError::Reference(_)) => "undefined",
                Err(err) => return Err(err),
            };
            return Ok(Value::String(type_of.into()));
        }

        let value = self.expression(&unary.argument)?;
        match op {
            "!" => Ok(Value::Bool(!value.truthy())),
            "-" => Ok(Value::Number(-value.to_number())),
            "+" => Ok(Value::Number(value.to_number())),
            "typeof" => Ok(Value::String(value.type_of().into())),
            "void" => Ok(Value::Undefined),
            _ => Err(self.unsupported("operator", unary.span)),
        }
    }

    fn update(&mut self, update: &UpdateExpression) -> Result<Value, EvalError> {
        let SimpleAssignmentTarget::AssignmentTargetIdentifier(ident) = &update.argument else {
            return Err(self.unsupported("update of", update.span));
        };

        let old = self.lookup(&ident.name)?.to_number();
        let new = if update.operator.as_str() == "++" {
            old + 1.0
        } else {
            old - 1.0
        };
        self.vars.insert(ident.name.to_string(), Value::Number(new));

        Ok(Value::Number(if update.prefix { new } else { old }))
    }

    fn logical(&mut self, logical: &LogicalExpression) -> Result<Value, EvalError> {
        let left = self.expression(&logical.left)?;
        let short_circuits = match logical.operator.as_str() {
            "||" => left.truthy(),
            "&&" => !left.truthy(),
            _ => !left.is_nullish(),
        };
        if short_circuits {
            Ok(left)
        } else {
            self.expression(&logical.right)
        }
    }

    fn assign(&mut self, assignment: &AssignmentExpression) -> Result<Value, EvalError> {
        let AssignmentTarget::AssignmentTargetIdentifier(ident) = &assignment.left else {
            return Err(self.unsupported("assignment to", assignment.span));
        };

        let op = assignment.operator.as_str();
        let value = match op {
            "=" => self.expression(&assignment.right)?,
            "||=" | "&&=" | "??=" => return Err(self.unsupported("assignment", assignment.span)),
            _ => {
                let current = self.lookup(&ident.name)?;
                let right = self.expression(&assignment.right)?;
                apply_binary(op.trim_end_matches('='), &current, &right)?
            }
        };

        self.vars.insert(ident.name.to_string(), value.clone());
        Ok(value)
    }

    // member chains return `None` once an optional link short-circuits

    fn chain_object(&mut self, object: &Expression) -> Result<Option<Value>, EvalError> {
        match object {
            Expression::StaticMemberExpression(member) => self.static_member(member),
            Expression::ComputedMemberExpression(member) => self.computed_member(member),
            Expression::CallExpression(call) => self.call_expression(call),
            other => self.expression(other).map(Some),
        }
    }

    fn static_member(
        &mut self,
        member: &StaticMemberExpression,
    ) -> Result<Option<Value>, EvalError> {
        let Some(object) = self.chain_object(&member.object)? else {
            return Ok(None);
        };
        if member.optional && object.is_nullish() {
            return Ok(None);
        }
        self.member(&object, &member.property.name).map(Some)
    }

    fn computed_member(
        &mut self,
        member: &ComputedMemberExpression,
    ) -> Result<Option<Value>, EvalError> {
        let Some(object) = self.chain_object(&member.object)? else {
            return Ok(None);
        };
        if member.optional && object.is_nullish() {
            return Ok(None);
        }
        let key = self.expression(&member.expression)?.to_string();
        self.member(&object, &key).map(Some)
    }

    fn call_expression(&mut self, call: &CallExpression) -> Result<Option<Value>, EvalError> {
        let Some(callee) = self.chain_object(&call.callee)? else {
            return Ok(None);
        };
        if call.optional && callee.is_nullish() {
            return Ok(None);
        }
        let args = self.arguments(&call.arguments)?;
        self.call(&callee, &args).map(Some)
    }

    fn arguments(&mut self, arguments: &[Argument]) -> Result<Vec<Value>, EvalError> {
        arguments
            .iter()
            .map(|argument| match argument.as_expression() {
                Some(expression) => self.expression(expression),
                None => Err(self.unsupported("argument", argument.span())),
            })
            .collect()
    }

    fn member(&self, value: &Value, name: &str) -> Result<Value, EvalError> {
        let result = match value {
            Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Undefined),
            Value::Array(items) if name == "length" => Value::Number(items.len() as f64),
            Value::Array(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx).cloned())
                .unwrap_or(Value::Undefined),
            Value::String(s) if name == "length" => Value::Number(s.encode_utf16().count() as f64),
            Value::String(s) => name
                .parse::<usize>()
                .ok()
                .and_then(|idx| s.chars().nth(idx))
                .map(|ch| Value::String(ch.to_string()))
                .unwrap_or(Value::Undefined),
            Value::Undefined | Value::Null => {
                return Err(EvalError::Type(format!(
                    "cannot read properties of {value} (reading '{name}')"
                )))
            }
            _ => Value::Undefined,
        };
        Ok(result)
    }

    fn call(&self, callee: &Value, args: &[Value]) -> Result<Value, EvalError> {
        match callee {
            Value::Builtin(builtin) => Ok(builtin.apply(args)),
            Value::Function => Err(EvalError::Unsupported("calling page functions".into())),
            other => Err(EvalError::Type(format!("{} is not a function", other.type_of()))),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.vars.get(name) {
            return Ok(value.clone());
        }
        if let Some(builtin) = Builtin::by_name(name) {
            return Ok(Value::Builtin(builtin));
        }
        match name {
            "undefined" => Ok(Value::Undefined),
            "NaN" => Ok(Value::Number(f64::NAN)),
            "Infinity" => Ok(Value::Number(f64::INFINITY)),
            _ => Err(EvalError::Reference(name.to_owned())),
        }
    }
}

fn apply_binary(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let value = match op {
        "+" if left.concatenates() || right.concatenates() => {
            Value::String(format!("{left}{right}"))
        }
        "+" => Value::Number(left.to_number() + right.to_number()),
        "-" => Value::Number(left.to_number() - right.to_number()),
        "*" => Value::Number(left.to_number() * right.to_number()),
        "/" => Value::Number(left.to_number() / right.to_number()),
        "%" => Value::Number(left.to_number() % right.to_number()),
        "===" => Value::Bool(strict_equals(left, right)),
        "!==" => Value::Bool(!strict_equals(left, right)),
        "==" => Value::Bool(loose_equals(left, right)),
        "!=" => Value::Bool(!loose_equals(left, right)),
        "<" | ">" | "<=" | ">=" => Value::Bool(compare(op, left, right)),
        _ => return Err(EvalError::Unsupported(format!("operator `{op}`"))),
    };
    Ok(value)
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => false,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Value::String(_), Value::String(_)) => strict_equals(left, right),
        (Value::Number(_) | Value::String(_) | Value::Bool(_), Value::Number(_) | Value::String(_) | Value::Bool(_)) => {
            left.to_number() == right.to_number()
        }
        (Value::Array(_) | Value::Object(_), Value::String(s))
        | (Value::String(s), Value::Array(_) | Value::Object(_)) => {
            let other = if matches!(left, Value::String(_)) { right } else { left };
            other.to_string() == *s
        }
        _ => strict_equals(left, right),
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return match op {
            "<" => a < b,
            ">" => a > b,
            "<=" => a <= b,
            _ => a >= b,
        };
    }

    let (a, b) = (left.to_number(), right.to_number());
    match op {
        "<" => a < b,
        ">" => a > b,
        "<=" => a <= b,
        _ => a >= b,
    }
}

fn parse_number(raw: &str) -> f64 {
    let raw = raw.replace('_', "");
    let radix = match raw.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0b" | "0B") => 2,
        Some("0o" | "0O") => 8,
        _ => return raw.parse().unwrap_or(f64::NAN),
    };
    i64::from_str_radix(&raw[2..], radix)
        .map(|n| n as f64)
        .unwrap_or(f64::NAN)
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if s.starts_with("0x") || s.starts_with("0X") => parse_number(s),
        _ if s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) => {
            s.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

fn parse_int(s: &str, radix: u32) -> f64 {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, s) = match s.get(..2) {
        Some("0x" | "0X") if radix == 10 || radix == 16 => (16, &s[2..]),
        _ => (radix, s),
    };

    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0f64, |acc, d| acc * f64::from(radix) + f64::from(d));
    if negative {
        -value
    } else {
        value
    }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n == f64::INFINITY {
        "Infinity".into()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".into()
    } else if n == 0.0 {
        "0".into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode_uri_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let hex = bytes
            .get(idx + 1..idx + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match (bytes[idx], hex) {
            (b'%', Some(byte)) => {
                out.push(byte);
                idx += 3;
            }
            (byte, _) => {
                out.push(byte);
                idx += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
