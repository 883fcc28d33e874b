//! C type registry for the generated host program.
//!
//! Three static tables drive the planners:
//! - scalar C type → printf conversion (used by mismatch diagnostics)
//! - OpenCL vector type (`cl_float4`, ...) → lane count + base scalar
//! - type → host size in bytes (LP64 host, OpenCL API types)

/// Generic printf conversion for types the registry does not know.
pub const FALLBACK_FORMAT: &str = "x";

/// Lane counts OpenCL defines for vector types.
const VECTOR_LANES: [u32; 5] = [2, 3, 4, 8, 16];

/// OpenCL vector scalar stem → (C base type used for printing, element bytes).
///
/// `half` prints through `float` on the host side.
const VECTOR_SCALARS: &[(&str, &str, u64)] = &[
    ("char", "char", 1),
    ("uchar", "unsigned char", 1),
    ("short", "short", 2),
    ("ushort", "unsigned short", 2),
    ("int", "int", 4),
    ("uint", "unsigned int", 4),
    ("long", "long", 8),
    ("ulong", "unsigned long", 8),
    ("half", "float", 2),
    ("float", "float", 4),
    ("double", "double", 8),
];

/// A fixed-width OpenCL vector type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorType {
    /// Number of addressable lanes (`.s[0]` .. `.s[lanes - 1]`).
    pub lanes: u32,
    /// Scalar C type of one lane, as used for printf lookup.
    pub base: &'static str,
    /// Size of one lane in bytes.
    pub lane_bytes: u64,
}

impl VectorType {
    /// Host size of one vector value. Three-lane vectors are stored as four.
    pub fn size_bytes(&self) -> u64 {
        let stored = if self.lanes == 3 { 4 } else { self.lanes };
        stored as u64 * self.lane_bytes
    }
}

/// Look up an OpenCL vector type by name (e.g. `cl_double2`).
pub fn vector_type(name: &str) -> Option<VectorType> {
    let rest = name.strip_prefix("cl_")?;
    let split = rest.find(|c: char| c.is_ascii_digit())?;
    let (stem, digits) = rest.split_at(split);
    let lanes: u32 = digits.parse().ok()?;
    if !VECTOR_LANES.contains(&lanes) {
        return None;
    }
    VECTOR_SCALARS
        .iter()
        .find(|(s, _, _)| *s == stem)
        .map(|&(_, base, lane_bytes)| VectorType {
            lanes,
            base,
            lane_bytes,
        })
}

/// Whether a type name is shaped like an OpenCL vector type (`cl_<name><digits>`).
///
/// Such names must resolve through [`vector_type`]; anything else is a
/// scalar and may be unknown to the registry.
pub fn looks_like_vector(name: &str) -> bool {
    name.strip_prefix("cl_")
        .is_some_and(|rest| rest.ends_with(|c: char| c.is_ascii_digit()))
}

/// printf conversion (without `%`) for a scalar C type.
pub fn printf_format(scalar: &str) -> Option<&'static str> {
    let format = match normalize(scalar).as_str() {
        "char" | "signed char" | "unsigned char" | "cl_char" | "cl_uchar" => "c",
        "short" | "short int" | "signed short" | "signed short int" | "cl_short" => "hd",
        "unsigned short" | "unsigned short int" | "cl_ushort" => "hu",
        "int" | "signed" | "signed int" | "cl_int" => "d",
        "unsigned" | "unsigned int" | "cl_uint" => "u",
        "long" | "long int" | "signed long" | "signed long int" | "cl_long" => "ld",
        "unsigned long" | "unsigned long int" | "cl_ulong" => "lu",
        "long long" | "long long int" | "signed long long" | "signed long long int" => "lld",
        "unsigned long long" | "unsigned long long int" => "llu",
        "float" | "cl_float" => "f",
        "double" | "cl_double" => "lf",
        "long double" => "Lf",
        _ => return None,
    };
    Some(format)
}

/// printf conversion for a scalar type, falling back to [`FALLBACK_FORMAT`].
pub fn format_token(scalar: &str) -> &'static str {
    printf_format(scalar).unwrap_or(FALLBACK_FORMAT)
}

/// Host size in bytes of a scalar or vector type, if known.
pub fn size_of(ty: &str) -> Option<u64> {
    if let Some(vector) = vector_type(ty) {
        return Some(vector.size_bytes());
    }
    let bytes = match normalize(ty).as_str() {
        "char" | "signed char" | "unsigned char" | "bool" | "cl_char" | "cl_uchar"
        | "cl_bool" => 1,
        "short" | "short int" | "signed short" | "signed short int" | "unsigned short"
        | "unsigned short int" | "cl_short" | "cl_ushort" | "cl_half" => 2,
        "int" | "signed" | "signed int" | "unsigned" | "unsigned int" | "float" | "cl_int"
        | "cl_uint" | "cl_float" => 4,
        "long" | "long int" | "signed long" | "signed long int" | "unsigned long"
        | "unsigned long int" | "long long" | "long long int" | "signed long long"
        | "signed long long int" | "unsigned long long" | "unsigned long long int" | "double"
        | "size_t" | "cl_long" | "cl_ulong" | "cl_double" => 8,
        "long double" => 16,
        _ => return None,
    };
    Some(bytes)
}

/// Collapse runs of whitespace so `unsigned  int` matches `unsigned int`.
fn normalize(ty: &str) -> String {
    ty.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `name` is a valid C identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// C keywords and standard type names that cannot name a variable.
const KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch",
    "typedef", "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex",
    "_Imaginary", "bool", "true", "false", "size_t", "half", "uchar", "ushort", "uint",
    "ulong",
];

/// Whether `name` is a C keyword or a type name the program may use.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_registry() {
        let v = vector_type("cl_float4").unwrap();
        assert_eq!(v.lanes, 4);
        assert_eq!(v.base, "float");
        assert_eq!(v.size_bytes(), 16);

        let v = vector_type("cl_uchar16").unwrap();
        assert_eq!(v.lanes, 16);
        assert_eq!(v.base, "unsigned char");

        let v = vector_type("cl_half2").unwrap();
        assert_eq!(v.base, "float");
        assert_eq!(v.size_bytes(), 4);
    }

    #[test]
    fn test_three_lane_vectors_are_padded() {
        let v = vector_type("cl_int3").unwrap();
        assert_eq!(v.lanes, 3);
        assert_eq!(v.size_bytes(), 16);
    }

    #[test]
    fn test_unknown_vectors() {
        assert!(vector_type("cl_float5").is_none());
        assert!(vector_type("cl_quad4").is_none());
        assert!(vector_type("float4").is_none());
        assert!(vector_type("cl_float").is_none());
        assert!(looks_like_vector("cl_float5"));
        assert!(looks_like_vector("cl_quad4"));
        assert!(!looks_like_vector("cl_float"));
        assert!(!looks_like_vector("float"));
    }

    #[test]
    fn test_printf_formats() {
        assert_eq!(printf_format("int"), Some("d"));
        assert_eq!(printf_format("unsigned  int"), Some("u"));
        assert_eq!(printf_format("double"), Some("lf"));
        assert_eq!(printf_format("long double"), Some("Lf"));
        assert_eq!(printf_format("cl_float"), Some("f"));
        assert_eq!(printf_format("cl_half"), None);
        assert_eq!(format_token("struct pixel"), FALLBACK_FORMAT);
        assert_eq!(format_token("unsigned long long"), "llu");
    }

    #[test]
    fn test_sizes() {
        assert_eq!(size_of("float"), Some(4));
        assert_eq!(size_of("cl_double"), Some(8));
        assert_eq!(size_of("unsigned char"), Some(1));
        assert_eq!(size_of("cl_double2"), Some(16));
        assert_eq!(size_of("struct pixel"), None);
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("vecAdd"));
        assert!(is_identifier("_tmp1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_keywords() {
        assert!(is_keyword("float"));
        assert!(is_keyword("return"));
        assert!(is_keyword("bool"));
        assert!(!is_keyword("floats"));
    }
}
