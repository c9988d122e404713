//! Demangling of function link names.
//!
//! The begin-line table is keyed by readable function names. Demangling is an
//! external concern, so the pass only sees the [`Demangler`] trait; failures must
//! degrade to returning the mangled name unchanged.

/// Turns a link name into a readable name.
pub trait Demangler {
    fn demangle(&self, mangled: &str) -> String;
}

/// Returns every name unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityDemangler;

impl Demangler for IdentityDemangler {
    fn demangle(&self, mangled: &str) -> String {
        mangled.to_string()
    }
}

/// Demangles Itanium C++ and Rust symbols.
///
/// C++ names are rendered without their parameter list and Rust names without
/// their hash suffix, so overloads and monomorphizations of one source
/// function share a key.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolDemangler;

impl Demangler for SymbolDemangler {
    fn demangle(&self, mangled: &str) -> String {
        let demangled = if is_rust_mangled(mangled) {
            demangle_rust(mangled).or_else(|| demangle_cpp(mangled))
        } else if is_itanium_cpp_mangled(mangled) {
            demangle_cpp(mangled)
        } else {
            None
        };
        demangled.unwrap_or_else(|| mangled.to_string())
    }
}

/// Rust v0 mangling starts with `_R`; legacy Rust symbols are Itanium-shaped
/// with a `17h<hash>E` tail.
pub fn is_rust_mangled(s: &str) -> bool {
    s.starts_with("_R") || (s.starts_with("_ZN") && s.contains("17h") && s.ends_with('E'))
}

pub fn is_itanium_cpp_mangled(s: &str) -> bool {
    s.starts_with("_Z")
}

fn demangle_rust(s: &str) -> Option<String> {
    rustc_demangle::try_demangle(s)
        .ok()
        .map(|sym| format!("{:#}", sym))
}

fn demangle_cpp(s: &str) -> Option<String> {
    let sym = cpp_demangle::Symbol::new(s).ok()?;
    let options = cpp_demangle::DemangleOptions::new().no_params();
    sym.demangle(&options).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(SymbolDemangler.demangle("main"), "main");
        assert_eq!(SymbolDemangler.demangle("foo.llvm.12"), "foo.llvm.12");
    }

    #[test]
    fn test_cpp_name_without_params() {
        assert_eq!(SymbolDemangler.demangle("_Z3fooi"), "foo");
        assert_eq!(SymbolDemangler.demangle("_ZN2ns3barEv"), "ns::bar");
    }

    #[test]
    fn test_invalid_mangling_degrades() {
        assert_eq!(SymbolDemangler.demangle("_Z"), "_Z");
        assert_eq!(IdentityDemangler.demangle("_Z3fooi"), "_Z3fooi");
    }

    #[test]
    fn test_rust_hash_dropped() {
        let name = SymbolDemangler.demangle("_ZN4core3fmt5write17h0123456789abcdefE");
        assert_eq!(name, "core::fmt::write");
    }
}
