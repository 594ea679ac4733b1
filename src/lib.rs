pub mod ast;
pub mod config;
pub mod cuda;
pub mod diagnostic;
pub mod error;
pub mod opencl;
pub mod rewrite;
pub mod syntax;

// Re-exports: front-end modules keep short `cudacl::X` paths
pub use config::project;
pub use syntax::lexeme;
pub use syntax::lexer;
pub use syntax::parser;
pub use syntax::resolve;
pub use syntax::span;

pub use config::TranslateOptions;
pub use error::{TranslateError, TranslateResult};
pub use rewrite::Translation;

use tracing::info;

use diagnostic::Diagnostic;
use lexer::Lexer;
use parser::Parser;
use rewrite::Session;

/// Parse a CUDA source without rendering diagnostics.
pub fn parse_source_silent(source: &str, _filename: &str) -> Result<ast::File, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source, 0).tokenize();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }
    Parser::new(tokens).parse_file()
}

/// Translate one CUDA program into an OpenCL host program.
///
/// Each call builds its own [`Session`], so calls on different inputs
/// may run concurrently.
pub fn translate(
    source: &str,
    filename: &str,
    options: &TranslateOptions,
) -> TranslateResult<Translation> {
    let mut file = parse_source_silent(source, filename).map_err(|diagnostics| {
        TranslateError::Parse {
            file: filename.to_string(),
            diagnostics,
        }
    })?;
    let symbols = resolve::resolve(&mut file);

    let mut session = Session::new(source, options, &symbols);
    rewrite::classify::classify(&mut session, &file)?;
    let translation = rewrite::assemble::assemble(session)?;

    info!(
        file = filename,
        kernels = translation.kernels.len(),
        edits = translation.edit_count,
        diagnostics = translation.diagnostics.len(),
        "translated"
    );
    Ok(translation)
}
