//! Program compiler front end.
//!
//! Builds run in three passes over the source text: option parsing, a
//! minimal preprocessor (object-like macros, conditionals, includes), and a
//! declaration parser which extracts every kernel signature. A kernel with
//! no registered native implementation fails the build.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use super::platform::DeviceConfig;
use super::program::KernelLibrary;
use crate::types::structs::{KernelParam, KernelSignature, ParamKind};
use crate::{KernelArgAccessQualifier, KernelArgAddressQualifier};

const MAIN_FILE: &str = "<program source>";
const MAX_INCLUDE_DEPTH: usize = 16;
const MAX_EXPANSION_PASSES: usize = 16;

const KNOWN_FLAGS: &[&str] = &["-cl-fast-relaxed-math", "-cl-mad-enable", "-cl-no-signed-zeros",
    "-cl-unsafe-math-optimizations", "-cl-finite-math-only", "-cl-opt-disable",
    "-cl-denorms-are-zero", "-cl-single-precision-constant", "-cl-kernel-arg-info", "-w",
    "-Werror"];

/// The result of a successful build for one device.
pub(crate) struct Compiled {
    pub(crate) kernels: Vec<KernelSignature>,
    pub(crate) defines: HashMap<String, String>,
    pub(crate) log: String,
}

#[derive(Default)]
struct Diagnostics {
    lines: Vec<String>,
    errors: usize,
}

impl Diagnostics {
    fn error<S: AsRef<str>>(&mut self, file: &str, line: usize, msg: S) {
        self.lines.push(format!("{}:{}: error: {}", file, line, msg.as_ref()));
        self.errors += 1;
    }

    fn warning<S: AsRef<str>>(&mut self, file: &str, line: usize, msg: S) {
        self.lines.push(format!("{}:{}: warning: {}", file, line, msg.as_ref()));
    }

    fn log(&self) -> String {
        self.lines.join("\n")
    }
}

//=============================================================================
//================================= OPTIONS ===================================
//=============================================================================

#[derive(Debug, Default)]
pub(crate) struct BuildOptions {
    pub(crate) defines: Vec<(String, String)>,
    pub(crate) include_dirs: Vec<PathBuf>,
    pub(crate) flags: Vec<String>,
}

fn split_define(def: &str) -> (String, String) {
    match def.find('=') {
        Some(i) => (def[..i].to_owned(), def[i + 1..].to_owned()),
        None => (def.to_owned(), "1".to_owned()),
    }
}

/// Parses a build option string.
pub(crate) fn parse_options(options: &str) -> Result<BuildOptions, String> {
    let mut opts = BuildOptions::default();
    let mut tokens = options.split_whitespace();

    while let Some(tok) = tokens.next() {
        if tok == "-D" {
            let def = tokens.next()
                .ok_or_else(|| "error: macro name missing after '-D'".to_owned())?;
            opts.defines.push(split_define(def));
        } else if let Some(def) = tok.strip_prefix("-D") {
            opts.defines.push(split_define(def));
        } else if tok == "-I" {
            let dir = tokens.next()
                .ok_or_else(|| "error: directory missing after '-I'".to_owned())?;
            opts.include_dirs.push(PathBuf::from(dir));
        } else if let Some(dir) = tok.strip_prefix("-I") {
            opts.include_dirs.push(PathBuf::from(dir));
        } else if KNOWN_FLAGS.contains(&tok) || tok.starts_with("-cl-std=") {
            opts.flags.push(tok.to_owned());
        } else {
            return Err(format!("error: unrecognized build option '{}'", tok));
        }
    }

    Ok(opts)
}

//=============================================================================
//=============================== PREPROCESSOR ================================
//=============================================================================

/// Blanks out comments, keeping newlines so line numbers survive.
fn strip_comments(src: &str, file: &str, diag: &mut Diagnostics) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    chars.next();
                }
                out.push(' ');
            },
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let start_line = line;
                let mut closed = false;
                while let Some(n) = chars.next() {
                    if n == '\n' {
                        line += 1;
                        out.push('\n');
                    } else if n == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    diag.error(file, start_line, "unterminated /* comment");
                }
                out.push(' ');
            },
            '"' | '\'' => {
                out.push(c);
                while let Some(n) = chars.next() {
                    out.push(n);
                    if n == '\\' {
                        if let Some(esc) = chars.next() {
                            out.push(esc);
                        }
                    } else if n == c || n == '\n' {
                        if n == '\n' {
                            line += 1;
                        }
                        break;
                    }
                }
            },
            '\n' => {
                line += 1;
                out.push(c);
            },
            _ => out.push(c),
        }
    }

    out
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    let end = s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or_else(|| s.len());
    (&s[..end], &s[end..])
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim().trim_end_matches(|c| c == 'u' || c == 'U' || c == 'l' || c == 'L');
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        s.parse::<i64>().ok()
    }
}

struct Cond {
    parent_active: bool,
    active: bool,
    taken: bool,
    else_seen: bool,
}

struct Preprocessor<'d> {
    defines: HashMap<String, String>,
    function_like: HashSet<String>,
    include_dirs: &'d [PathBuf],
    diag: &'d mut Diagnostics,
}

impl<'d> Preprocessor<'d> {
    fn value(&self, term: &str) -> i64 {
        let t = term.trim().trim_start_matches('(').trim_end_matches(')').trim();
        match self.defines.get(t) {
            Some(v) => parse_int(v).unwrap_or(0),
            None => parse_int(t).unwrap_or(0),
        }
    }

    fn eval_term(&self, term: &str) -> bool {
        let t = term.trim();
        if let Some(rest) = t.strip_prefix('!') {
            return !self.eval_term(rest);
        }
        if let Some(rest) = t.strip_prefix("defined") {
            let name = rest.trim().trim_start_matches('(').trim_end_matches(')').trim();
            return self.defines.contains_key(name);
        }
        for op in &[">=", "<=", "==", "!=", ">", "<"] {
            if let Some(i) = t.find(op) {
                let (l, r) = (self.value(&t[..i]), self.value(&t[i + op.len()..]));
                return match *op {
                    ">=" => l >= r,
                    "<=" => l <= r,
                    "==" => l == r,
                    "!=" => l != r,
                    ">" => l > r,
                    _ => l < r,
                };
            }
        }
        self.value(t) != 0
    }

    fn eval(&self, expr: &str) -> bool {
        expr.split("||").any(|conj| conj.split("&&").all(|term| self.eval_term(term)))
    }

    fn expand_once(&self, line: &str) -> (String, bool) {
        let chars: Vec<char> = line.chars().collect();
        let mut out = String::with_capacity(line.len());
        let mut changed = false;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '"' || c == '\'' {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        out.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    i += 1;
                    if chars[i - 1] == c {
                        break;
                    }
                }
            } else if c.is_ascii_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                match self.defines.get(&ident) {
                    Some(val) if !self.function_like.contains(&ident) => {
                        out.push_str(val);
                        changed = true;
                    },
                    _ => out.push_str(&ident),
                }
            } else if c.is_ascii_digit() {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    out.push(chars[i]);
                    i += 1;
                }
            } else {
                out.push(c);
                i += 1;
            }
        }

        (out, changed)
    }

    fn expand(&self, line: &str) -> String {
        let mut current = line.to_owned();
        for _ in 0..MAX_EXPANSION_PASSES {
            let (next, changed) = self.expand_once(&current);
            current = next;
            if !changed {
                break;
            }
        }
        current
    }

    fn include(&mut self, file: &str, lineno: usize, arg: &str, out: &mut String, depth: usize) {
        let arg = arg.trim();
        let name = arg.trim_start_matches(|c| c == '"' || c == '<')
            .trim_end_matches(|c| c == '"' || c == '>');

        if depth >= MAX_INCLUDE_DEPTH {
            self.diag.error(file, lineno, format!("#include nested too deeply ('{}')", name));
            return;
        }

        let dirs: &'d [PathBuf] = self.include_dirs;
        let candidates = dirs.iter().map(|d| d.join(name))
            .chain(std::iter::once(PathBuf::from(name)));

        for path in candidates {
            if let Ok(contents) = fs::read_to_string(&path) {
                let display = path.display().to_string();
                self.process(&display, &contents, out, depth + 1);
                return;
            }
        }

        self.diag.error(file, lineno, format!("'{}' file not found", name));
    }

    fn process(&mut self, file: &str, src: &str, out: &mut String, depth: usize) {
        let text = strip_comments(&src.replace("\\\n", " "), file, self.diag);
        let mut conds: Vec<Cond> = Vec::new();
        let mut last_line = 0;

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;
            last_line = lineno;
            let active = conds.last().map_or(true, |c| c.active);
            let trimmed = line.trim_start();

            let rest = match trimmed.strip_prefix('#') {
                Some(rest) => rest,
                None => {
                    if active {
                        out.push_str(&self.expand(line));
                    }
                    out.push('\n');
                    continue;
                },
            };

            let (directive, arg) = split_word(rest);
            match directive {
                "ifdef" | "ifndef" => {
                    let defined = self.defines.contains_key(split_word(arg).0);
                    let cond = if directive == "ifdef" { defined } else { !defined };
                    conds.push(Cond { parent_active: active, active: active && cond, taken: cond,
                        else_seen: false });
                },
                "if" => {
                    let cond = active && self.eval(arg);
                    conds.push(Cond { parent_active: active, active: cond, taken: cond,
                        else_seen: false });
                },
                "elif" => {
                    let cond = self.eval(arg);
                    match conds.last_mut() {
                        Some(c) if !c.else_seen => {
                            c.active = c.parent_active && !c.taken && cond;
                            c.taken |= cond;
                        },
                        Some(_) => self.diag.error(file, lineno, "#elif after #else"),
                        None => self.diag.error(file, lineno, "#elif without #if"),
                    }
                },
                "else" => match conds.last_mut() {
                    Some(c) if !c.else_seen => {
                        c.active = c.parent_active && !c.taken;
                        c.taken = true;
                        c.else_seen = true;
                    },
                    Some(_) => self.diag.error(file, lineno, "#else after #else"),
                    None => self.diag.error(file, lineno, "#else without #if"),
                },
                "endif" => {
                    if conds.pop().is_none() {
                        self.diag.error(file, lineno, "#endif without #if");
                    }
                },
                _ if !active => (),
                "define" => {
                    let (name, body) = split_word(arg);
                    if name.is_empty() {
                        self.diag.error(file, lineno, "macro name missing");
                    } else if body.starts_with('(') {
                        self.diag.warning(file, lineno,
                            format!("function-like macro '{}' is not expanded", name));
                        self.function_like.insert(name.to_owned());
                        self.defines.insert(name.to_owned(), String::new());
                    } else {
                        self.function_like.remove(name);
                        self.defines.insert(name.to_owned(), body.trim().to_owned());
                    }
                },
                "undef" => {
                    let name = split_word(arg).0;
                    self.defines.remove(name);
                    self.function_like.remove(name);
                },
                "include" => self.include(file, lineno, arg, out, depth),
                "error" => self.diag.error(file, lineno, format!("#error {}", arg.trim())),
                "pragma" | "line" | "" => (),
                other => self.diag.error(file, lineno,
                    format!("invalid preprocessing directive '#{}'", other)),
            }
            out.push('\n');
        }

        if !conds.is_empty() {
            self.diag.error(file, last_line, "unterminated conditional directive");
        }
    }
}

//=============================================================================
//================================== PARSER ===================================
//=============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Ident(String),
    Punct(char),
    Literal,
}

fn tokenize(text: &str) -> Vec<(Tok, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut toks = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            line += 1;
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            toks.push((Tok::Ident(chars[start..i].iter().collect()), line));
        } else if c.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            toks.push((Tok::Literal, line));
        } else if c == '"' || c == '\'' {
            i += 1;
            while i < chars.len() && chars[i] != c && chars[i] != '\n' {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
            toks.push((Tok::Literal, line));
        } else {
            toks.push((Tok::Punct(c), line));
            i += 1;
        }
    }

    toks
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Verifies that every bracket is balanced.
fn check_balance(toks: &[(Tok, usize)], diag: &mut Diagnostics) {
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (tok, line) in toks {
        match *tok {
            Tok::Punct(c @ '(') | Tok::Punct(c @ '[') | Tok::Punct(c @ '{') => stack.push((c, *line)),
            Tok::Punct(c @ ')') | Tok::Punct(c @ ']') | Tok::Punct(c @ '}') => {
                match stack.pop() {
                    Some((open, _)) if closing(open) == c => (),
                    Some((open, open_line)) => {
                        diag.error(MAIN_FILE, *line, format!("expected '{}' to match '{}' on line {}",
                            closing(open), open, open_line));
                        return;
                    },
                    None => {
                        diag.error(MAIN_FILE, *line, format!("unexpected '{}'", c));
                        return;
                    },
                }
            },
            _ => (),
        }
    }

    if let Some((open, line)) = stack.pop() {
        diag.error(MAIN_FILE, line, format!("expected '{}' at end of input to match '{}'",
            closing(open), open));
    }
}

/// Returns the size in bytes of a built-in scalar or vector type.
fn scalar_size(ty: &str, address_bits: u32) -> Option<usize> {
    let digits = ty.trim_start_matches(|c: char| !c.is_ascii_digit());
    let base = &ty[..ty.len() - digits.len()];
    let base_size = match base {
        "bool" | "char" | "uchar" => 1,
        "short" | "ushort" | "half" => 2,
        "int" | "uint" | "float" => 4,
        "long" | "ulong" | "double" => 8,
        "size_t" | "ptrdiff_t" | "intptr_t" | "uintptr_t" => address_bits as usize / 8,
        _ => return None,
    };
    let lanes = match digits {
        "" => 1,
        "3" => 4,
        "2" | "4" | "8" | "16" => digits.parse::<usize>().ok()?,
        _ => return None,
    };
    Some(base_size * lanes)
}

fn normalize_type(words: &[&str]) -> String {
    let joined = words.join(" ");
    match joined.as_str() {
        "unsigned char" => "uchar".to_owned(),
        "unsigned short" => "ushort".to_owned(),
        "unsigned int" | "unsigned" => "uint".to_owned(),
        "unsigned long" => "ulong".to_owned(),
        "signed char" => "char".to_owned(),
        _ => joined,
    }
}

fn parse_param(toks: &[(Tok, usize)], line: usize, address_bits: u32, diag: &mut Diagnostics)
        -> Option<KernelParam> {
    let mut address = KernelArgAddressQualifier::Private;
    let mut access = KernelArgAccessQualifier::None;
    let mut pointer = false;
    let mut words: Vec<&str> = Vec::new();

    for (tok, _) in toks {
        match *tok {
            Tok::Ident(ref id) => match id.as_str() {
                "__global" | "global" => address = KernelArgAddressQualifier::Global,
                "__local" | "local" => address = KernelArgAddressQualifier::Local,
                "__constant" | "constant" => address = KernelArgAddressQualifier::Constant,
                "__private" | "private" => address = KernelArgAddressQualifier::Private,
                "__read_only" | "read_only" => access = KernelArgAccessQualifier::ReadOnly,
                "__write_only" | "write_only" => access = KernelArgAccessQualifier::WriteOnly,
                "__read_write" | "read_write" => access = KernelArgAccessQualifier::ReadWrite,
                "const" | "restrict" | "__restrict" | "volatile" => (),
                other => words.push(other),
            },
            Tok::Punct('*') => pointer = true,
            _ => (),
        }
    }

    let name = match words.pop() {
        Some(name) if !words.is_empty() => name.to_owned(),
        _ => {
            diag.error(MAIN_FILE, line, "kernel parameter requires a type and a name");
            return None;
        },
    };

    let base = normalize_type(&words);
    let kind = if base.starts_with("image") && base.ends_with("_t") {
        if access == KernelArgAccessQualifier::None {
            access = KernelArgAccessQualifier::ReadOnly;
        }
        address = KernelArgAddressQualifier::Global;
        ParamKind::Image
    } else if base == "sampler_t" {
        ParamKind::Sampler
    } else if pointer {
        match address {
            KernelArgAddressQualifier::Local => ParamKind::LocalPointer,
            KernelArgAddressQualifier::Global | KernelArgAddressQualifier::Constant => {
                ParamKind::Pointer
            },
            KernelArgAddressQualifier::Private => {
                diag.error(MAIN_FILE, line, format!("pointer parameter '{}' must point to the \
                    global, local, or constant address space", name));
                return None;
            },
        }
    } else {
        ParamKind::Scalar { size: scalar_size(&base, address_bits) }
    };

    let type_name = if pointer { format!("{}*", base) } else { base };

    Some(KernelParam { name, type_name, address, access, kind })
}

fn skip_attributes(toks: &[(Tok, usize)], mut i: usize) -> usize {
    while i < toks.len() && toks[i].0 == Tok::Ident("__attribute__".to_owned()) {
        i += 1;
        let mut depth = 0;
        while i < toks.len() {
            match toks[i].0 {
                Tok::Punct('(') => depth += 1,
                Tok::Punct(')') => {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                },
                _ => (),
            }
            i += 1;
        }
    }
    i
}

/// Extracts every kernel definition.
fn parse_kernels(toks: &[(Tok, usize)], address_bits: u32, diag: &mut Diagnostics)
        -> Vec<KernelSignature> {
    let mut kernels = Vec::new();
    let mut depth = 0i32;
    let mut i = 0;

    while i < toks.len() {
        match toks[i].0 {
            Tok::Punct('{') => depth += 1,
            Tok::Punct('}') => depth -= 1,
            Tok::Ident(ref id) if depth == 0 && (id == "__kernel" || id == "kernel") => {
                let line = toks[i].1;
                let mut j = skip_attributes(toks, i + 1);

                match toks.get(j) {
                    Some((Tok::Ident(ret), _)) if ret == "void" => j += 1,
                    _ => {
                        diag.error(MAIN_FILE, line, "kernel functions must return void");
                        i += 1;
                        continue;
                    },
                }
                j = skip_attributes(toks, j);

                let name = match (toks.get(j), toks.get(j + 1)) {
                    (Some((Tok::Ident(name), _)), Some((Tok::Punct('('), _))) => name.clone(),
                    _ => {
                        diag.error(MAIN_FILE, line, "expected kernel name and parameter list");
                        i += 1;
                        continue;
                    },
                };
                j += 2;

                let mut params = Vec::new();
                let mut current: Vec<(Tok, usize)> = Vec::new();
                let mut paren = 1;
                while j < toks.len() {
                    let (ref tok, tline) = toks[j];
                    match *tok {
                        Tok::Punct('(') => paren += 1,
                        Tok::Punct(')') => {
                            paren -= 1;
                            if paren == 0 {
                                break;
                            }
                        },
                        Tok::Punct(',') if paren == 1 => {
                            params.push((std::mem::replace(&mut current, Vec::new()), tline));
                            j += 1;
                            continue;
                        },
                        _ => (),
                    }
                    current.push((tok.clone(), tline));
                    j += 1;
                }
                if !current.is_empty() {
                    params.push((current, line));
                }
                j += 1;

                let is_void_list = params.len() == 1
                    && params[0].0.len() == 1
                    && params[0].0[0].0 == Tok::Ident("void".to_owned());

                let params = if is_void_list {
                    Vec::new()
                } else {
                    params.iter()
                        .filter_map(|(ptoks, pline)| parse_param(ptoks, *pline, address_bits, diag))
                        .collect()
                };

                // Prototypes are skipped; only definitions declare entry points.
                if let Some((Tok::Punct('{'), _)) = toks.get(j) {
                    kernels.push(KernelSignature { name, params, line });
                }
                i = j;
                continue;
            },
            _ => (),
        }
        i += 1;
    }

    kernels
}

//=============================================================================
//================================= COMPILE ===================================
//=============================================================================

fn predefined(device: &DeviceConfig, opts: &BuildOptions) -> HashMap<String, String> {
    let mut defines = HashMap::new();
    for &(name, val) in &[("__OPENCL_VERSION__", "120"), ("__OPENCL_C_VERSION__", "120"),
            ("CL_VERSION_1_0", "100"), ("CL_VERSION_1_1", "110"), ("CL_VERSION_1_2", "120"),
            ("__ENDIAN_LITTLE__", "1"), ("__kernel_exec", "")] {
        defines.insert(name.to_owned(), val.to_owned());
    }
    if device.image_support {
        defines.insert("__IMAGE_SUPPORT__".to_owned(), "1".to_owned());
    }
    if opts.flags.iter().any(|f| f == "-cl-fast-relaxed-math") {
        defines.insert("__FAST_RELAXED_MATH__".to_owned(), "1".to_owned());
    }
    for ext in &device.extensions {
        defines.insert(ext.clone(), "1".to_owned());
    }
    for (name, val) in &opts.defines {
        defines.insert(name.clone(), val.clone());
    }
    defines
}

/// Compiles `source` for one device.
///
/// On failure the returned string is the complete build log.
pub(crate) fn compile(source: &str, options: &str, device: &DeviceConfig, library: &KernelLibrary)
        -> Result<Compiled, String> {
    let opts = parse_options(options)?;
    let mut diag = Diagnostics::default();

    let (text, defines) = {
        let mut pp = Preprocessor {
            defines: predefined(device, &opts),
            function_like: HashSet::new(),
            include_dirs: &opts.include_dirs,
            diag: &mut diag,
        };
        let mut text = String::with_capacity(source.len());
        pp.process(MAIN_FILE, source, &mut text, 0);
        (text, pp.defines)
    };

    let toks = tokenize(&text);
    check_balance(&toks, &mut diag);
    if diag.errors > 0 {
        return Err(diag.log());
    }

    let kernels = parse_kernels(&toks, device.address_bits, &mut diag);
    let mut seen = HashSet::new();
    for kernel in &kernels {
        if !seen.insert(kernel.name.as_str()) {
            diag.error(MAIN_FILE, kernel.line, format!("redefinition of kernel '{}'", kernel.name));
        }
        if !library.contains(&kernel.name) {
            diag.error(MAIN_FILE, kernel.line, format!("no native implementation of kernel '{}' \
                is available for device '{}'", kernel.name, device.name));
        }
    }

    if diag.errors > 0 {
        Err(diag.log())
    } else {
        Ok(Compiled { kernels, defines, log: diag.log() })
    }
}
