use crate::error::CliError;

const SEPARATOR: char = '-';

/// Turn operator text into a URL-safe token: lowercase ASCII alphanumerics,
/// every other run of characters collapsed to a single dash, no dash at either end.
pub fn slugify(input: &str) -> Result<String, CliError> {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        return Err(CliError::EmptyInput(input.to_string()));
    }
    Ok(slug)
}

/// Author field of a tag: a slug with the separators dropped, so the tag
/// grammar can split author from description on the first dash.
pub fn author_token(input: &str) -> Result<String, CliError> {
    Ok(slugify(input)?.replace(SEPARATOR, ""))
}
