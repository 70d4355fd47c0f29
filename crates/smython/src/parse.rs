//! Hand-written LL(1) recursive-descent parser.
//!
//! One function per production, a single token of lookahead, no recovery:
//! the first violation raises a syntax error carrying the current line.
//!
//! The grammar:
//!
//! ```text
//! file_input: {NEWLINE | stmt} EOF
//! stmt: simple_stmt | compound_stmt
//! simple_stmt: small_stmt {';' small_stmt} [';'] NEWLINE
//! small_stmt: expr_stmt | pass_stmt | flow_stmt | import_stmt | global_stmt | assert_stmt
//! expr_stmt: testlist [('=' | '+=' | '-=' | '*=' | '/=' | '%=' | '|=' | '&=') testlist]
//! pass_stmt: 'pass'
//! flow_stmt: 'break' | 'continue' | 'return' [testlist] | 'raise' test
//! import_stmt: 'import' NAME {',' NAME} | 'from' NAME 'import' ('*' | NAME {',' NAME})
//! global_stmt: 'global' NAME {',' NAME}
//! assert_stmt: 'assert' test [',' test]
//! compound_stmt: if_stmt | while_stmt | for_stmt | try_stmt | funcdef | classdef
//! if_stmt: 'if' test ':' suite {'elif' test ':' suite} ['else' ':' suite]
//! while_stmt: 'while' test ':' suite ['else' ':' suite]
//! for_stmt: 'for' exprlist 'in' testlist ':' suite ['else' ':' suite]
//! try_stmt: 'try' ':' suite (except_clause {except_clause} ['else' ':' suite]
//!                            | 'finally' ':' suite)
//! except_clause: 'except' [test ['as' NAME]] ':' suite
//! funcdef: 'def' NAME parameters ':' suite
//! parameters: '(' [parameter {',' parameter} [',']] ')'
//! parameter: NAME ['=' test] | '*' NAME
//! classdef: 'class' NAME ['(' [test] ')'] ':' suite
//! suite: simple_stmt | NEWLINE INDENT stmt {stmt} DEDENT
//! test: or_test ['if' or_test 'else' test]
//! or_test: and_test {'or' and_test}
//! and_test: not_test {'and' not_test}
//! not_test: 'not' not_test | comparison
//! comparison: expr {comp_op expr}
//! comp_op: '<' | '>' | '==' | '>=' | '<=' | '!=' | 'in' | 'not' 'in' | 'is' ['not']
//! expr: and_expr {'|' and_expr}
//! and_expr: arith_expr {'&' arith_expr}
//! arith_expr: term {('+' | '-') term}
//! term: factor {('*' | '/' | '%') factor}
//! factor: ('+' | '-') factor | power
//! power: atom {trailer}
//! trailer: '(' [test {',' test} [',']] ')' | '[' subscript ']' | '.' NAME
//! subscript: test | [test] ':' [test] [':' [test]]
//! atom: '(' [testlist] ')' | '[' [test {',' test} [',']] ']'
//!       | '{' [dictorsetmaker] '}' | NAME | NUMBER | STRING {STRING}
//! dictorsetmaker: test ':' test {',' test ':' test} [','] | test {',' test} [',']
//! exprlist: expr {',' expr} [',']
//! testlist: test {',' test} [',']
//! ```
//!
//! A subscript containing `:` is a slice; the parser emits it as a synthetic
//! call to the builtin `slice`, producing the 3-tuple `(start, stop, step)`
//! with `None` for the omitted parts.

use std::rc::Rc;

use crate::{
    exceptions::Exception,
    expressions::{BinOp, CmpOp, ExceptClause, Expr, Literal, Param, Signature, Stmt, Suite, UnaryOp},
    intern::{Interns, StaticStrings, StringId},
    scan::{Scanner, Token, TokenKind, decode_string},
};

/// Parses a complete source text into its top-level suite.
pub(crate) fn parse(source: &str, interns: &mut Interns) -> Result<Suite, Exception> {
    Parser::new(source, interns)?.parse_file()
}

struct Parser<'i> {
    interns: &'i mut Interns,
    scanner: Scanner,
    current: Token,
}

impl<'i> Parser<'i> {
    fn new(source: &str, interns: &'i mut Interns) -> Result<Self, Exception> {
        let mut scanner = Scanner::new(source);
        let current = scanner.next().expect("scanner yields at least EOF")?;
        Ok(Self {
            interns,
            scanner,
            current,
        })
    }

    /// Consumes the current token, returning it; sticks at `EOF`.
    fn advance(&mut self) -> Result<Token, Exception> {
        let next = match self.scanner.next() {
            Some(token) => token?,
            None => self.current.clone(),
        };
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error(&self, message: impl Into<String>) -> Exception {
        Exception::syntax(message, self.current.line())
    }

    fn check(&self, lexeme: &str) -> bool {
        self.current.lexeme() == lexeme
    }

    /// Consumes the current token if its lexeme equals `lexeme`.
    fn at(&mut self, lexeme: &str) -> Result<bool, Exception> {
        if self.check(lexeme) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the expected lexeme or raises a syntax error naming it.
    fn expect(&mut self, lexeme: &str) -> Result<Token, Exception> {
        if self.check(lexeme) {
            self.advance()
        } else {
            Err(self.error(format!("expected '{lexeme}'")))
        }
    }

    fn expect_newline(&mut self) -> Result<(), Exception> {
        if self.current.kind() == TokenKind::Newline {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error("expected end of line"))
        }
    }

    fn expect_name(&mut self) -> Result<StringId, Exception> {
        if self.current.is_name() {
            let id = self.interns.intern(self.current.lexeme());
            self.advance()?;
            Ok(id)
        } else if self.current.is_keyword() {
            Err(self.error(format!("expected a name, found keyword '{}'", self.current.lexeme())))
        } else {
            Err(self.error("expected a name"))
        }
    }

    /// Whether the current token can begin a `test` expression.
    fn starts_test(&self) -> bool {
        if self.current.is_name() || self.current.is_number() || self.current.is_string() {
            return true;
        }
        matches!(self.current.lexeme(), "(" | "[" | "{" | "not" | "+" | "-")
    }

    // === statements ===

    fn parse_file(mut self) -> Result<Suite, Exception> {
        let mut stmts = Vec::new();
        loop {
            match self.current.kind() {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance()?;
                }
                _ => self.parse_stmt(&mut stmts)?,
            }
        }
        Ok(Suite { stmts })
    }

    /// Parses one statement line; a simple line may contribute several small
    /// statements.
    fn parse_stmt(&mut self, out: &mut Vec<Stmt>) -> Result<(), Exception> {
        if self.at("if")? {
            out.push(self.parse_if()?);
        } else if self.at("while")? {
            out.push(self.parse_while()?);
        } else if self.at("for")? {
            out.push(self.parse_for()?);
        } else if self.at("try")? {
            out.push(self.parse_try()?);
        } else if self.at("def")? {
            out.push(self.parse_def()?);
        } else if self.at("class")? {
            out.push(self.parse_class()?);
        } else {
            self.parse_simple_line(out)?;
        }
        Ok(())
    }

    fn parse_suite(&mut self) -> Result<Suite, Exception> {
        let mut stmts = Vec::new();
        if self.current.kind() == TokenKind::Newline {
            self.advance()?;
            if self.current.kind() != TokenKind::Indent {
                return Err(self.error("expected an indented block"));
            }
            self.advance()?;
            while self.current.kind() != TokenKind::Dedent {
                if self.current.kind() == TokenKind::Eof {
                    return Err(self.error("unexpected end of input in indented block"));
                }
                self.parse_stmt(&mut stmts)?;
            }
            self.advance()?;
        } else {
            self.parse_simple_line(&mut stmts)?;
        }
        Ok(Suite { stmts })
    }

    fn parse_simple_line(&mut self, out: &mut Vec<Stmt>) -> Result<(), Exception> {
        loop {
            out.push(self.parse_small()?);
            if !self.at(";")? {
                break;
            }
            if self.current.kind() == TokenKind::Newline {
                break; // trailing semicolon
            }
        }
        self.expect_newline()
    }

    fn parse_small(&mut self) -> Result<Stmt, Exception> {
        if self.at("pass")? {
            return Ok(Stmt::Pass);
        }
        if self.at("break")? {
            return Ok(Stmt::Break);
        }
        if self.at("continue")? {
            return Ok(Stmt::Continue);
        }
        if self.at("return")? {
            let expr = if self.starts_test() {
                self.parse_testlist()?
            } else {
                Expr::Lit(Literal::None)
            };
            return Ok(Stmt::Return(expr));
        }
        if self.at("raise")? {
            return Ok(Stmt::Raise(self.parse_test()?));
        }
        if self.at("assert")? {
            let test = self.parse_test()?;
            let msg = if self.at(",")? { Some(self.parse_test()?) } else { None };
            return Ok(Stmt::Assert { test, msg });
        }
        if self.at("global")? {
            return Ok(Stmt::Global(self.parse_name_list()?));
        }
        if self.at("import")? {
            return Ok(Stmt::Import(self.parse_name_list()?));
        }
        if self.at("from")? {
            let module = self.expect_name()?;
            self.expect("import")?;
            let names = if self.at("*")? {
                Vec::new()
            } else {
                self.parse_name_list()?
            };
            return Ok(Stmt::FromImport { module, names });
        }
        self.parse_expr_stmt()
    }

    fn parse_name_list(&mut self) -> Result<Vec<StringId>, Exception> {
        let mut names = vec![self.expect_name()?];
        while self.at(",")? {
            names.push(self.expect_name()?);
        }
        Ok(names)
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, Exception> {
        let first = self.parse_testlist()?;
        if self.at("=")? {
            if !first.is_assignable() {
                return Err(self.error("cannot assign to this expression"));
            }
            let value = self.parse_testlist()?;
            return Ok(Stmt::Assign { target: first, value });
        }
        let aug = match self.current.lexeme() {
            "+=" => Some(BinOp::Add),
            "-=" => Some(BinOp::Sub),
            "*=" => Some(BinOp::Mul),
            "/=" => Some(BinOp::Div),
            "%=" => Some(BinOp::Mod),
            "|=" => Some(BinOp::BitOr),
            "&=" => Some(BinOp::BitAnd),
            _ => None,
        };
        if let Some(op) = aug {
            if !matches!(first, Expr::Var(_) | Expr::Attr { .. } | Expr::Index { .. }) {
                return Err(self.error("illegal expression for augmented assignment"));
            }
            self.advance()?;
            let value = self.parse_testlist()?;
            return Ok(Stmt::AugAssign { target: first, op, value });
        }
        Ok(Stmt::Expr(first))
    }

    fn parse_if(&mut self) -> Result<Stmt, Exception> {
        let test = self.parse_test()?;
        self.expect(":")?;
        let then = self.parse_suite()?;
        let orelse = if self.at("elif")? {
            // elif chains nest as an else-suite holding a single `if`
            Suite {
                stmts: vec![self.parse_if()?],
            }
        } else if self.at("else")? {
            self.expect(":")?;
            self.parse_suite()?
        } else {
            Suite { stmts: Vec::new() }
        };
        Ok(Stmt::If { test, then, orelse })
    }

    fn parse_while(&mut self) -> Result<Stmt, Exception> {
        let test = self.parse_test()?;
        self.expect(":")?;
        let body = self.parse_suite()?;
        let orelse = self.parse_opt_else()?;
        Ok(Stmt::While { test, body, orelse })
    }

    fn parse_for(&mut self) -> Result<Stmt, Exception> {
        let target = self.parse_exprlist()?;
        if !target.is_assignable() {
            return Err(self.error("cannot assign to this expression"));
        }
        self.expect("in")?;
        let iter = self.parse_testlist()?;
        self.expect(":")?;
        let body = self.parse_suite()?;
        let orelse = self.parse_opt_else()?;
        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
        })
    }

    fn parse_opt_else(&mut self) -> Result<Suite, Exception> {
        if self.at("else")? {
            self.expect(":")?;
            self.parse_suite()
        } else {
            Ok(Suite { stmts: Vec::new() })
        }
    }

    fn parse_try(&mut self) -> Result<Stmt, Exception> {
        self.expect(":")?;
        let body = self.parse_suite()?;
        if self.at("finally")? {
            self.expect(":")?;
            let finally = self.parse_suite()?;
            return Ok(Stmt::TryFinally { body, finally });
        }
        let mut clauses = Vec::new();
        while self.at("except")? {
            let test = if self.check(":") { None } else { Some(self.parse_test()?) };
            let name = if self.at("as")? { Some(self.expect_name()?) } else { None };
            self.expect(":")?;
            let clause_body = self.parse_suite()?;
            clauses.push(ExceptClause {
                test,
                name,
                body: clause_body,
            });
        }
        if clauses.is_empty() {
            return Err(self.error("expected 'except' or 'finally'"));
        }
        let orelse = self.parse_opt_else()?;
        Ok(Stmt::TryExcept { body, clauses, orelse })
    }

    fn parse_def(&mut self) -> Result<Stmt, Exception> {
        let name = self.expect_name()?;
        self.expect("(")?;
        let signature = self.parse_parameters()?;
        self.expect(":")?;
        let body = self.parse_suite()?;
        Ok(Stmt::Def {
            name,
            signature: Rc::new(signature),
            body: Rc::new(body),
        })
    }

    fn parse_parameters(&mut self) -> Result<Signature, Exception> {
        let mut params = Vec::new();
        let mut var_param = None;
        let mut seen_default = false;
        while !self.check(")") {
            if var_param.is_some() {
                return Err(self.error("parameter after '*' parameter"));
            }
            if self.at("*")? {
                var_param = Some(self.expect_name()?);
            } else {
                let name = self.expect_name()?;
                let default = if self.at("=")? { Some(self.parse_test()?) } else { None };
                if default.is_none() && seen_default {
                    return Err(self.error("non-default argument follows default argument"));
                }
                seen_default = default.is_some();
                params.push(Param { name, default });
            }
            if !self.at(",")? {
                break;
            }
        }
        self.expect(")")?;
        Ok(Signature { params, var_param })
    }

    fn parse_class(&mut self) -> Result<Stmt, Exception> {
        let name = self.expect_name()?;
        // omitted or empty parentheses both mean no superclass
        let superclass = if self.at("(")? {
            if self.at(")")? {
                None
            } else {
                let expr = self.parse_test()?;
                self.expect(")")?;
                Some(expr)
            }
        } else {
            None
        };
        self.expect(":")?;
        let body = self.parse_suite()?;
        Ok(Stmt::Class {
            name,
            superclass,
            body: Rc::new(body),
        })
    }

    // === expressions ===

    /// `expr {',' expr} [',']` — the comparison-free level used for `for`
    /// targets, where a bare `in` must terminate the list.
    fn parse_exprlist(&mut self) -> Result<Expr, Exception> {
        let first = self.parse_bitor()?;
        if !self.check(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.at(",")? {
            if !self.starts_test() {
                break;
            }
            items.push(self.parse_bitor()?);
        }
        Ok(Expr::Tuple(items))
    }

    /// `test {',' test} [',']` — one or more commas make a tuple; a single
    /// expression without a trailing comma stays itself.
    fn parse_testlist(&mut self) -> Result<Expr, Exception> {
        let first = self.parse_test()?;
        if !self.check(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.at(",")? {
            if !self.starts_test() {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_test(&mut self) -> Result<Expr, Exception> {
        let then = self.parse_or()?;
        if self.at("if")? {
            let test = self.parse_or()?;
            self.expect("else")?;
            let orelse = self.parse_test()?;
            return Ok(Expr::Cond {
                test: Box::new(test),
                then: Box::new(then),
                orelse: Box::new(orelse),
            });
        }
        Ok(then)
    }

    fn parse_or(&mut self) -> Result<Expr, Exception> {
        let mut left = self.parse_and()?;
        while self.at("or")? {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Exception> {
        let mut left = self.parse_not()?;
        while self.at("and")? {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, Exception> {
        if self.at("not")? {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, Exception> {
        let first = self.parse_bitor()?;
        let mut rest = Vec::new();
        while let Some(op) = self.parse_comp_op()? {
            rest.push((op, self.parse_bitor()?));
        }
        if rest.is_empty() {
            return Ok(first);
        }
        Ok(Expr::Comparison {
            first: Box::new(first),
            rest,
        })
    }

    fn parse_comp_op(&mut self) -> Result<Option<CmpOp>, Exception> {
        let op = match self.current.lexeme() {
            "<" => CmpOp::Lt,
            ">" => CmpOp::Gt,
            "==" => CmpOp::Eq,
            ">=" => CmpOp::Ge,
            "<=" => CmpOp::Le,
            "!=" => CmpOp::Ne,
            "in" => CmpOp::In,
            "is" => {
                self.advance()?;
                if self.at("not")? {
                    return Ok(Some(CmpOp::IsNot));
                }
                return Ok(Some(CmpOp::Is));
            }
            "not" => {
                self.advance()?;
                self.expect("in")?;
                return Ok(Some(CmpOp::NotIn));
            }
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(op))
    }

    fn parse_bitor(&mut self) -> Result<Expr, Exception> {
        let mut left = self.parse_bitand()?;
        while self.at("|")? {
            left = Expr::Binary {
                op: BinOp::BitOr,
                left: Box::new(left),
                right: Box::new(self.parse_bitand()?),
            };
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr, Exception> {
        let mut left = self.parse_arith()?;
        while self.at("&")? {
            left = Expr::Binary {
                op: BinOp::BitAnd,
                left: Box::new(left),
                right: Box::new(self.parse_arith()?),
            };
        }
        Ok(left)
    }

    fn parse_arith(&mut self) -> Result<Expr, Exception> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current.lexeme() {
                "+" => BinOp::Add,
                "-" => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(self.parse_term()?),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, Exception> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current.lexeme() {
                "*" => BinOp::Mul,
                "/" => BinOp::Div,
                "%" => BinOp::Mod,
                _ => break,
            };
            self.advance()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(self.parse_factor()?),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, Exception> {
        let op = match self.current.lexeme() {
            "+" => UnaryOp::Pos,
            "-" => UnaryOp::Neg,
            _ => return self.parse_power(),
        };
        self.advance()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(self.parse_factor()?),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, Exception> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.at("(")? {
                let mut args = Vec::new();
                while !self.check(")") {
                    args.push(self.parse_test()?);
                    if !self.at(",")? {
                        break;
                    }
                }
                self.expect(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.at("[")? {
                let index = self.parse_subscript()?;
                self.expect("]")?;
                expr = Expr::Index {
                    obj: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.at(".")? {
                if !self.current.is_name() {
                    return Err(self.error("expected an attribute name"));
                }
                let name = self.interns.intern(self.current.lexeme());
                self.advance()?;
                expr = Expr::Attr {
                    obj: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// A plain test is an index; any form containing `:` becomes a call to
    /// the builtin `slice`.
    fn parse_subscript(&mut self) -> Result<Expr, Exception> {
        let start = if self.check(":") { None } else { Some(self.parse_test()?) };
        if !self.check(":") {
            return start.ok_or_else(|| self.error("expected a subscript"));
        }
        self.advance()?;
        let stop = if self.starts_test() { Some(self.parse_test()?) } else { None };
        let step = if self.at(":")? {
            if self.starts_test() { Some(self.parse_test()?) } else { None }
        } else {
            None
        };
        let none = || Expr::Lit(Literal::None);
        Ok(Expr::Call {
            callee: Box::new(Expr::Var(StaticStrings::Slice.id())),
            args: vec![
                start.unwrap_or_else(none),
                stop.unwrap_or_else(none),
                step.unwrap_or_else(none),
            ],
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, Exception> {
        if self.at("(")? {
            if self.at(")")? {
                return Ok(Expr::Tuple(Vec::new()));
            }
            let expr = self.parse_testlist()?;
            self.expect(")")?;
            return Ok(expr);
        }
        if self.at("[")? {
            let mut items = Vec::new();
            while !self.check("]") {
                items.push(self.parse_test()?);
                if !self.at(",")? {
                    break;
                }
            }
            self.expect("]")?;
            return Ok(Expr::List(items));
        }
        if self.at("{")? {
            return self.parse_dict_or_set();
        }
        if self.current.is_name() {
            let expr = match self.current.lexeme() {
                "True" => Expr::Lit(Literal::Bool(true)),
                "False" => Expr::Lit(Literal::Bool(false)),
                "None" => Expr::Lit(Literal::None),
                name => Expr::Var(self.interns.intern(name)),
            };
            self.advance()?;
            return Ok(expr);
        }
        if self.current.is_number() {
            let lexeme = self.current.lexeme();
            let literal = if lexeme.contains('.') {
                Literal::Float(lexeme.parse().expect("scanner produced a valid float"))
            } else {
                // integer literals beyond i64 fall back to float
                match lexeme.parse::<i64>() {
                    Ok(n) => Literal::Int(n),
                    Err(_) => Literal::Float(lexeme.parse().expect("scanner produced a valid number")),
                }
            };
            self.advance()?;
            return Ok(Expr::Lit(literal));
        }
        if self.current.is_string() {
            // adjacent string literals concatenate at parse time
            let mut text = decode_string(self.current.lexeme());
            self.advance()?;
            while self.current.is_string() {
                text.push_str(&decode_string(self.current.lexeme()));
                self.advance()?;
            }
            return Ok(Expr::Lit(Literal::Str(Rc::from(text))));
        }
        let found = match self.current.kind() {
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Indent | TokenKind::Dedent => "indentation".to_string(),
            _ => format!("'{}'", self.current.lexeme()),
        };
        Err(self.error(format!("unexpected {found}")))
    }

    fn parse_dict_or_set(&mut self) -> Result<Expr, Exception> {
        if self.at("}")? {
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.parse_test()?;
        if self.at(":")? {
            let value = self.parse_test()?;
            let mut pairs = vec![(first, value)];
            while self.at(",")? {
                if self.check("}") {
                    break;
                }
                let key = self.parse_test()?;
                self.expect(":")?;
                pairs.push((key, self.parse_test()?));
            }
            self.expect("}")?;
            return Ok(Expr::Dict(pairs));
        }
        let mut items = vec![first];
        while self.at(",")? {
            if self.check("}") {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect("}")?;
        Ok(Expr::Set(items))
    }
}
