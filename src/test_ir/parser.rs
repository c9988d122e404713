//! TIR (Test IR) parser implementation.

use super::*;
use crate::core::metadata::{DIFile, DILabel, DILexicalBlock, DILocation, DISubprogram};
use std::collections::HashMap;

pub fn parse_ir(text: &str) -> Result<TestIR, String> {
    let parser = Parser::new(text);
    parser.parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    ir: TestIR,

    // Global maps
    funcs: HashMap<&'a str, u32>,

    // Per-function maps
    blocks: HashMap<&'a str, u32>,
    values: HashMap<&'a str, u32>,
    block_resolves: Vec<Resolve<'a>>,
    value_resolves: Vec<Resolve<'a>>,
    callee_resolves: Vec<&'a str>,
}

#[derive(Debug)]
struct Resolve<'a> {
    name: &'a str,
    index: u32,
}

/// Right-hand side of a metadata field.
#[derive(Debug, Clone, PartialEq)]
enum FieldValue<'a> {
    Number(u64),
    Str(String),
    Ref(MdRef),
    Null,
    /// Enumerators, flags and anything else kept verbatim.
    Ident(&'a str),
    List(Vec<FieldValue<'a>>),
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            ir: TestIR::new(),
            funcs: HashMap::new(),
            blocks: HashMap::new(),
            values: HashMap::new(),
            block_resolves: Vec::new(),
            value_resolves: Vec::new(),
            callee_resolves: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<TestIR, String> {
        self.skip_whitespace(true);

        while !self.is_eof() {
            let result = if self.current_char() == Some('!') {
                self.parse_metadata()
            } else {
                self.parse_function()
            };
            if let Err(e) = result {
                return Err(self.with_context(e));
            }
            self.skip_whitespace(true);
        }

        self.validate_metadata()?;

        Ok(self.ir)
    }

    fn with_context(&self, err: String) -> String {
        let pos = self.pos.min(self.text.len());
        let line = self.text[..pos].matches('\n').count() + 1;
        let line_start = self.text[..pos].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.text[pos..].find('\n').map_or(self.text.len(), |i| pos + i);
        format!(
            "{} (line {}: '{}')",
            err,
            line,
            self.text[line_start..line_end].trim()
        )
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn next_char(&self) -> Option<char> {
        let mut chars = self.text[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self, skip_newlines: bool) {
        while let Some(ch) = self.current_char() {
            if ch == ';' {
                // Skip comment line
                while let Some(ch) = self.current_char() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                if ch == '\n' && !skip_newlines {
                    break;
                }
                self.advance();
            } else {
                break;
            }
        }
    }

    fn try_read(&mut self, ch: char) -> bool {
        self.skip_whitespace(true);
        if self.current_char() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Like `try_read`, but never looks past the end of the line.
    fn try_read_inline(&mut self, ch: char) -> bool {
        self.skip_whitespace(false);
        if self.current_char() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn try_read_keyword(&mut self, word: &str) -> bool {
        let saved_pos = self.pos;
        match self.read_identifier() {
            Ok(found) if found == word => true,
            _ => {
                self.pos = saved_pos;
                false
            }
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), String> {
        if !self.try_read(ch) {
            return Err(format!(
                "Expected '{}' but found {:?}",
                ch,
                self.current_char()
            ));
        }
        Ok(())
    }

    fn read_identifier(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace(true);
        let start = self.pos;

        match self.current_char() {
            Some(ch) if ch.is_alphanumeric() || ch == '_' => {}
            Some(ch) => return Err(format!("Expected identifier but found '{}'", ch)),
            None => return Err("Expected identifier but found EOF".to_string()),
        }

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '$' {
                self.advance();
            } else {
                break;
            }
        }

        Ok(&self.text[start..self.pos])
    }

    fn read_value_name(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace(true);
        self.expect('%')?;
        self.read_identifier()
    }

    fn read_block_name(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace(true);
        self.expect('^')?;
        self.read_identifier()
    }

    fn read_number(&mut self) -> Result<u64, String> {
        self.skip_whitespace(true);
        let rest = &self.text[self.pos..];

        let (digits, radix, prefix) = if rest.starts_with("0x") || rest.starts_with("0X") {
            (&rest[2..], 16, 2)
        } else {
            (rest, 10, 0)
        };
        let len = digits
            .find(|c: char| !c.is_digit(radix))
            .unwrap_or(digits.len());
        if len == 0 {
            return Err("Expected number".to_string());
        }

        let value = u64::from_str_radix(&digits[..len], radix)
            .map_err(|e| format!("Failed to parse number: {}", e))?;
        self.pos += prefix + len;
        Ok(value)
    }

    fn read_u32(&mut self) -> Result<u32, String> {
        let value = self.read_number()?;
        u32::try_from(value).map_err(|_| format!("Number {} does not fit in 32 bits", value))
    }

    fn read_string(&mut self) -> Result<String, String> {
        self.expect('"')?;
        let mut result = String::new();
        loop {
            match self.current_char() {
                None => return Err("Unterminated string".to_string()),
                Some('"') => {
                    self.advance();
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self
                        .current_char()
                        .ok_or_else(|| "Unterminated string".to_string())?;
                    result.push(escaped);
                    self.advance();
                }
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
    }

    // -------- metadata ---------

    fn parse_metadata(&mut self) -> Result<(), String> {
        self.expect('!')?;
        let id = self.read_u32()?;
        self.expect('=')?;
        self.try_read_keyword("distinct");

        let node = if self.try_read('!') {
            self.expect('{')?;
            self.parse_value_list('}')?;
            MetadataNode::Other {
                tag: "MDTuple".to_string(),
            }
        } else {
            let kind = self.read_identifier()?;
            self.expect('(')?;
            let fields = self.parse_fields()?;
            build_node(kind, &fields)?
        };

        if self.ir.metadata.insert(MdRef(id), node).is_some() {
            return Err(format!("Duplicate metadata definition: !{}", id));
        }
        Ok(())
    }

    fn parse_fields(&mut self) -> Result<HashMap<&'a str, FieldValue<'a>>, String> {
        let mut fields = HashMap::new();
        if self.try_read(')') {
            return Ok(fields);
        }
        loop {
            let name = self.read_identifier()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            if fields.insert(name, value).is_some() {
                return Err(format!("Duplicate metadata field '{}'", name));
            }
            if !self.try_read(',') {
                self.expect(')')?;
                return Ok(fields);
            }
        }
    }

    fn parse_value_list(&mut self, close: char) -> Result<Vec<FieldValue<'a>>, String> {
        let mut items = Vec::new();
        if self.try_read(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_value()?);
            if !self.try_read(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_value(&mut self) -> Result<FieldValue<'a>, String> {
        self.skip_whitespace(true);
        match self.current_char() {
            Some('"') => Ok(FieldValue::Str(self.read_string()?)),
            Some('!') => {
                self.advance();
                if self.try_read('{') {
                    Ok(FieldValue::List(self.parse_value_list('}')?))
                } else {
                    Ok(FieldValue::Ref(MdRef(self.read_u32()?)))
                }
            }
            Some('[') => {
                self.advance();
                Ok(FieldValue::List(self.parse_value_list(']')?))
            }
            Some(ch) if ch.is_ascii_digit() => Ok(FieldValue::Number(self.read_number()?)),
            Some('-') => {
                let start = self.pos;
                self.advance();
                self.read_number()?;
                Ok(FieldValue::Ident(&self.text[start..self.pos]))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let start = self.pos;
                let word = self.read_identifier()?;
                if word == "null" {
                    return Ok(FieldValue::Null);
                }
                // Flag sets: DIFlagA | DIFlagB
                while self.try_read('|') {
                    self.read_identifier()?;
                }
                Ok(FieldValue::Ident(&self.text[start..self.pos]))
            }
            other => Err(format!("Unexpected {:?} in metadata value", other)),
        }
    }

    fn validate_metadata(&self) -> Result<(), String> {
        if let Some(md) = self
            .ir
            .attachments
            .iter()
            .find(|md| !self.ir.metadata.contains(**md))
        {
            return Err(format!("Undefined metadata reference: {}", md));
        }
        if let Some((node, missing)) = self.ir.metadata.find_dangling() {
            return Err(format!(
                "Undefined metadata reference: {} (used by {})",
                missing, node
            ));
        }
        Ok(())
    }

    /// Parse `!kind !N` pairs up to the end of the line.
    fn parse_attachments(&mut self) -> Result<(u32, u32), String> {
        let begin = self.ir.attachments.len() as u32;
        loop {
            self.skip_whitespace(false);
            let is_attachment = self.current_char() == Some('!')
                && self.next_char().is_some_and(|c| c.is_alphabetic());
            if !is_attachment {
                break;
            }
            self.advance();
            self.read_identifier()?;
            if !self.try_read_inline('!') {
                return Err("Expected '!N' after attachment kind".to_string());
            }
            let id = self.read_u32()?;
            self.ir.attachments.push(MdRef(id));
        }
        Ok((begin, self.ir.attachments.len() as u32))
    }

    // -------- functions ---------

    fn parse_function(&mut self) -> Result<(), String> {
        let func_name = self.read_identifier()?;
        let func_idx = self.ir.functions.len() as u32;

        // Check for duplicate function names
        if self.funcs.contains_key(func_name) {
            return Err(format!("Duplicate function definition: '{}'", func_name));
        }

        // Reset per-function state
        self.blocks.clear();
        self.values.clear();
        self.block_resolves.clear();
        self.value_resolves.clear();
        self.callee_resolves.clear();

        // Parse arguments
        self.expect('(')?;
        let arg_begin_idx = self.ir.values.len() as u32;

        while !self.try_read(')') {
            let arg_name = self.read_value_name()?;
            let arg_idx = self.ir.values.len() as u32;
            let attach_idx = self.ir.attachments.len() as u32;

            self.values.insert(arg_name, arg_idx);
            self.ir.values.push(Value {
                name: arg_name.to_string(),
                value_type: ValueType::Arg,
                op: Operation::None,
                callee: None,
                op_count: 0,
                op_begin_idx: 0,
                op_end_idx: 0,
                attach_begin_idx: attach_idx,
                attach_end_idx: attach_idx,
            });

            if !self.try_read(',') && self.current_char() != Some(')') {
                return Err("Expected ',' or ')' in argument list".to_string());
            }
        }

        let arg_end_idx = self.ir.values.len() as u32;

        // A lone '!' marks a declaration, '!name' starts an attachment
        self.skip_whitespace(false);
        let is_declaration = self.current_char() == Some('!')
            && !self.next_char().is_some_and(|c| c.is_alphabetic());

        let block_begin_idx = self.ir.blocks.len() as u32;
        let (attach_begin_idx, attach_end_idx) = if is_declaration {
            self.advance();
            let idx = self.ir.attachments.len() as u32;
            (idx, idx)
        } else {
            let attachments = self.parse_attachments()?;

            self.expect('{')?;
            while !self.try_read('}') {
                self.parse_block()?;
            }

            self.resolve_function_references()?;
            attachments
        };
        let block_end_idx = self.ir.blocks.len() as u32;

        self.funcs.insert(func_name, func_idx);
        self.ir.functions.push(Function {
            name: func_name.to_string(),
            declaration: is_declaration,
            block_begin_idx,
            block_end_idx,
            arg_begin_idx,
            arg_end_idx,
            attach_begin_idx,
            attach_end_idx,
        });

        Ok(())
    }

    fn parse_block(&mut self) -> Result<(), String> {
        self.skip_whitespace(true);
        let block_name = self.read_identifier()?;
        self.expect(':')?;

        let block_idx = self.ir.blocks.len() as u32;
        if self.blocks.insert(block_name, block_idx).is_some() {
            return Err(format!("Duplicate block name: '{}'", block_name));
        }

        let max_trip = if self.try_read_keyword("maxtrip") {
            self.expect('(')?;
            let trip = self.read_u32()?;
            self.expect(')')?;
            Some(trip)
        } else {
            None
        };

        let inst_begin_idx = self.ir.values.len() as u32;
        let mut phi_end_idx = inst_begin_idx;

        // We'll collect successors after parsing all instructions
        let mut successor_refs = Vec::new();

        // Parse instructions
        while !self.is_at_block_end() {
            if self.peek_phi() {
                // Only allow PHIs if we haven't parsed any non-PHI instructions yet
                if self.ir.values.len() as u32 > phi_end_idx {
                    return Err("PHI nodes must be at the beginning of a block".to_string());
                }
                self.parse_phi()?;
                phi_end_idx = self.ir.values.len() as u32;
            } else {
                self.parse_instruction(&mut successor_refs)?;
            }
        }

        let inst_end_idx = self.ir.values.len() as u32;

        // Now add successor references to value_operands
        let succ_begin_idx = self.ir.value_operands.len() as u32;
        for succ_name in &successor_refs {
            self.block_resolves.push(Resolve {
                name: succ_name,
                index: self.ir.value_operands.len() as u32,
            });
            self.ir.value_operands.push(0); // Placeholder
        }
        let succ_end_idx = self.ir.value_operands.len() as u32;

        self.ir.blocks.push(Block {
            name: block_name.to_string(),
            succ_begin_idx,
            succ_end_idx,
            inst_begin_idx,
            phi_end_idx,
            inst_end_idx,
            max_trip,
        });

        Ok(())
    }

    fn is_at_block_end(&mut self) -> bool {
        self.skip_whitespace(true);

        if self.is_eof() || self.current_char() == Some('}') {
            return true;
        }

        // Next block starts: identifier followed by ':'
        let saved_pos = self.pos;
        let is_label = self.read_identifier().is_ok() && {
            self.skip_whitespace(false);
            self.current_char() == Some(':')
        };
        self.pos = saved_pos;
        is_label
    }

    fn peek_phi(&mut self) -> bool {
        let saved_pos = self.pos;
        let is_phi = self.read_value_name().is_ok()
            && self.try_read('=')
            && self.read_identifier().is_ok_and(|op| op == "phi");
        self.pos = saved_pos;
        is_phi
    }

    fn push_resolve(&mut self, value: bool, name: &'a str) {
        let resolve = Resolve {
            name,
            index: self.ir.value_operands.len() as u32,
        };
        if value {
            self.value_resolves.push(resolve);
        } else {
            self.block_resolves.push(resolve);
        }
        self.ir.value_operands.push(0); // Placeholder
    }

    fn parse_phi(&mut self) -> Result<(), String> {
        let name = self.read_value_name()?;
        self.expect('=')?;

        let op_name = self.read_identifier()?;
        if op_name != "phi" {
            return Err(format!("Expected 'phi' but found '{}'", op_name));
        }

        let val_idx = self.ir.values.len() as u32;
        self.values.insert(name, val_idx);

        // Parse incoming values: [^block, %value], ...
        let mut incoming = Vec::new();
        loop {
            self.expect('[')?;
            let block_name = self.read_block_name()?;
            self.expect(',')?;
            let val_name = self.read_value_name()?;
            self.expect(']')?;
            incoming.push((block_name, val_name));

            if !self.try_read_inline(',') {
                break;
            }
        }

        // Values first, then blocks
        let op_begin_idx = self.ir.value_operands.len() as u32;
        for (_, val_name) in &incoming {
            self.push_resolve(true, val_name);
        }
        for (block_name, _) in &incoming {
            self.push_resolve(false, block_name);
        }
        let op_end_idx = self.ir.value_operands.len() as u32;

        let (attach_begin_idx, attach_end_idx) = self.parse_attachments()?;

        self.ir.values.push(Value {
            name: name.to_string(),
            value_type: ValueType::Phi,
            op: Operation::None,
            callee: None,
            op_count: incoming.len() as u32,
            op_begin_idx,
            op_end_idx,
            attach_begin_idx,
            attach_end_idx,
        });

        Ok(())
    }

    fn parse_instruction(&mut self, successors: &mut Vec<&'a str>) -> Result<(), String> {
        self.skip_whitespace(true);

        // Check for value definition
        let (name, op) = if self.current_char() == Some('%') {
            let name = self.read_value_name()?;
            self.expect('=')?;

            // "%v =" alone, "%v = %a, %b" and "%v = !dbg !N" are "any" operations
            self.skip_whitespace(false);
            let op = match self.current_char() {
                None | Some('\n') | Some('%') | Some('!') => Operation::Any,
                _ => {
                    let op_str = self.read_identifier()?;
                    Operation::parse(op_str)
                        .ok_or_else(|| format!("Unknown operation: {}", op_str))?
                }
            };

            (Some(name), op)
        } else {
            let op_str = self.read_identifier()?;
            let op =
                Operation::parse(op_str).ok_or_else(|| format!("Unknown operation: {}", op_str))?;
            (None, op)
        };

        let info = op.info();

        if name.is_some() && !info.is_def {
            return Err(format!("Operation '{}' does not produce a value", info.name));
        }
        if name.is_none() && info.is_def && op != Operation::Call {
            return Err(format!("Operation '{}' requires a result value", info.name));
        }

        let val_idx = self.ir.values.len() as u32;
        if let Some(name) = name {
            self.values.insert(name, val_idx);
        }

        let op_begin_idx = self.ir.value_operands.len() as u32;
        let mut callee = None;

        match op {
            Operation::Alloca => {
                // alloca <size>, <align>
                let size = self.read_u32()?;
                self.expect(',')?;
                let align = self.read_u32()?;
                self.ir.value_operands.push(size);
                self.ir.value_operands.push(align);
            }
            Operation::Terminate | Operation::None => {}
            Operation::Br => {
                let block_name = self.read_block_name()?;
                self.push_resolve(false, block_name);
                successors.push(block_name);
            }
            Operation::CondBr => {
                // condbr %cond, ^true_block, ^false_block
                let cond_name = self.read_value_name()?;
                self.expect(',')?;
                let true_block = self.read_block_name()?;
                self.expect(',')?;
                let false_block = self.read_block_name()?;

                self.push_resolve(true, cond_name);
                self.push_resolve(false, true_block);
                self.push_resolve(false, false_block);
                successors.push(true_block);
                successors.push(false_block);
            }
            Operation::Jump => {
                // jump ^block1, ^block2, ...
                loop {
                    let block_name = self.read_block_name()?;
                    self.push_resolve(false, block_name);
                    successors.push(block_name);

                    if !self.try_read_inline(',') {
                        break;
                    }
                }
            }
            Operation::Ret => {
                let val_name = self.read_value_name()?;
                self.push_resolve(true, val_name);
            }
            Operation::Add | Operation::Sub => {
                let a_name = self.read_value_name()?;
                self.expect(',')?;
                let b_name = self.read_value_name()?;
                self.push_resolve(true, a_name);
                self.push_resolve(true, b_name);
            }
            Operation::Call => {
                // call @func_name, %arg1, ... or call %fn_ptr, %arg1, ...
                self.skip_whitespace(false);
                callee = Some(match self.current_char() {
                    Some('@') => {
                        self.advance();
                        Callee::Direct(self.read_identifier()?.to_string())
                    }
                    Some('%') => {
                        let target = self.read_value_name()?;
                        self.callee_resolves.push(target);
                        Callee::Indirect(target.to_string())
                    }
                    _ => return Err("Expected '@name' or '%value' after call".to_string()),
                });
                self.parse_inline_value_list(true)?;
            }
            Operation::Any => {
                self.parse_inline_value_list(false)?;
            }
        }

        let op_end_idx = self.ir.value_operands.len() as u32;
        let (attach_begin_idx, attach_end_idx) = self.parse_attachments()?;

        self.ir.values.push(Value {
            name: name.map(|n| n.to_string()).unwrap_or_default(),
            value_type: if info.is_terminator {
                ValueType::Terminator
            } else {
                ValueType::Normal
            },
            op,
            callee,
            op_count: match op {
                Operation::Any | Operation::Call => op_end_idx - op_begin_idx,
                _ => info.op_count,
            },
            op_begin_idx,
            op_end_idx,
            attach_begin_idx,
            attach_end_idx,
        });

        Ok(())
    }

    /// Comma-separated `%value` operands on the current line. With
    /// `leading_comma`, the list must start with a comma (call arguments).
    fn parse_inline_value_list(&mut self, leading_comma: bool) -> Result<(), String> {
        let mut first = true;
        loop {
            if !first || leading_comma {
                if !self.try_read_inline(',') {
                    return Ok(());
                }
            }
            self.skip_whitespace(false);
            if self.current_char() != Some('%') {
                if first && !leading_comma {
                    return Ok(());
                }
                return Err("Expected '%value' in operand list".to_string());
            }
            first = false;
            let val_name = self.read_value_name()?;
            self.push_resolve(true, val_name);
        }
    }

    fn resolve_function_references(&mut self) -> Result<(), String> {
        for resolve in &self.value_resolves {
            if let Some(&idx) = self.values.get(resolve.name) {
                self.ir.value_operands[resolve.index as usize] = idx;
            } else {
                return Err(format!("Undefined value reference: {}", resolve.name));
            }
        }

        for resolve in &self.block_resolves {
            if let Some(&idx) = self.blocks.get(resolve.name) {
                self.ir.value_operands[resolve.index as usize] = idx;
            } else {
                return Err(format!("Undefined block reference: {}", resolve.name));
            }
        }

        if let Some(name) = self
            .callee_resolves
            .iter()
            .find(|name| !self.values.contains_key(**name))
        {
            return Err(format!("Undefined value reference: {}", name));
        }

        Ok(())
    }
}

/// Typed access to the fields of one metadata node.
struct Fields<'f, 'a> {
    kind: &'a str,
    map: &'f HashMap<&'a str, FieldValue<'a>>,
}

impl<'f, 'a> Fields<'f, 'a> {
    fn mismatch(&self, name: &str, expected: &str) -> String {
        format!("Field '{}' of {} must be {}", name, self.kind, expected)
    }

    fn missing(&self, name: &str) -> String {
        format!("{} is missing field '{}'", self.kind, name)
    }

    fn string(&self, name: &str) -> Result<Option<String>, String> {
        match self.map.get(name) {
            None => Ok(None),
            Some(FieldValue::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.mismatch(name, "a string")),
        }
    }

    fn number(&self, name: &str) -> Result<u32, String> {
        match self.map.get(name) {
            None => Ok(0),
            Some(FieldValue::Number(n)) => {
                u32::try_from(*n).map_err(|_| self.mismatch(name, "a 32-bit number"))
            }
            Some(_) => Err(self.mismatch(name, "a number")),
        }
    }

    fn reference(&self, name: &str) -> Result<Option<MdRef>, String> {
        match self.map.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Ref(md)) => Ok(Some(*md)),
            Some(_) => Err(self.mismatch(name, "a metadata reference")),
        }
    }

    fn required_reference(&self, name: &str) -> Result<MdRef, String> {
        self.reference(name)?.ok_or_else(|| self.missing(name))
    }

    fn references(&self, name: &str) -> Result<Vec<MdRef>, String> {
        match self.map.get(name) {
            None | Some(FieldValue::Null) => Ok(Vec::new()),
            Some(FieldValue::List(items)) => items
                .iter()
                .map(|item| match item {
                    FieldValue::Ref(md) => Ok(*md),
                    _ => Err(self.mismatch(name, "a list of metadata references")),
                })
                .collect(),
            Some(_) => Err(self.mismatch(name, "a list")),
        }
    }
}

fn build_node<'a>(
    kind: &'a str,
    map: &HashMap<&'a str, FieldValue<'a>>,
) -> Result<MetadataNode, String> {
    let fields = Fields { kind, map };
    let node = match kind {
        "DIFile" => MetadataNode::File(DIFile {
            filename: fields
                .string("filename")?
                .ok_or_else(|| fields.missing("filename"))?,
            directory: fields.string("directory")?.unwrap_or_default(),
        }),
        "DISubprogram" => MetadataNode::Subprogram(DISubprogram {
            name: fields.string("name")?.unwrap_or_default(),
            linkage_name: fields.string("linkageName")?,
            file: fields.required_reference("file")?,
            line: fields.number("line")?,
            retained_nodes: fields.references("retainedNodes")?,
        }),
        "DILexicalBlock" => MetadataNode::LexicalBlock(DILexicalBlock {
            scope: fields.required_reference("scope")?,
            file: fields.required_reference("file")?,
            line: fields.number("line")?,
            column: fields.number("column")?,
        }),
        "DILocation" => MetadataNode::Location(DILocation {
            line: fields.number("line")?,
            column: fields.number("column")?,
            scope: fields.required_reference("scope")?,
            inlined_at: fields.reference("inlinedAt")?,
        }),
        "DILabel" => MetadataNode::Label(DILabel {
            scope: fields.reference("scope")?,
            name: fields.string("name")?.ok_or_else(|| fields.missing("name"))?,
            file: fields.required_reference("file")?,
            line: fields.number("line")?,
        }),
        _ => MetadataNode::Other {
            tag: kind.to_string(),
        },
    };
    Ok(node)
}
