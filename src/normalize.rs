//! Text normalization shared by index time and query time
//!
//! Record text is embedded after this normalization, and query snippets must go
//! through the exact same rule or nearest-neighbour recall degrades:
//!
//! 1. remove `/* ... */` comments
//! 2. replace `// ...` line comments, `import ...;` and `pragma ...;` with a space
//! 3. collapse every whitespace run to a single space and trim

use regex::Regex;

/// Normalize Solidity text for embedding
pub fn normalize_code(code: &str) -> Result<String, regex::Error> {
    let block_comment = Regex::new(r"/\*[\s\S]*?\*/")?;
    let line_noise = Regex::new(r"(//.*|import\s+[^;]*;|pragma\s+[^;]*;)")?;
    let whitespace = Regex::new(r"\s+")?;

    let code = block_comment.replace_all(code, "");
    let code = line_noise.replace_all(&code, " ");
    let code = whitespace.replace_all(&code, " ");
    Ok(code.trim().to_string())
}
