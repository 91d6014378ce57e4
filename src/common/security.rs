// Saneamento de entrada: texto livre vindo do cliente nunca chega cru na
// persistência nem nos logs.

const MAX_TEXT_LEN: usize = 1000;

/// Remove caracteres de operador (`$`), apara espaços e limita o tamanho.
pub fn sanitize_string(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| *c != '$').collect();
    let trimmed = cleaned.trim();
    trimmed.chars().take(MAX_TEXT_LEN).collect()
}

pub fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize_string)
}

/// Validação mínima de formato de e-mail (algo@algo.algo).
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || local.contains(char::is_whitespace) {
        return false;
    }
    let mut domain_parts = domain.rsplitn(2, '.');
    let (Some(tld), Some(host)) = (domain_parts.next(), domain_parts.next()) else {
        return false;
    };
    !tld.is_empty() && !host.is_empty() && !domain.contains(char::is_whitespace)
}

/// E-mails legados foram gravados sem pontos na parte local; a busca por
/// e-mail tenta essa forma quando a canônica não existe.
pub fn legacy_dotless_email(email: &str) -> Option<String> {
    let stripped: String = email.chars().filter(|c| *c != '.').collect();
    if stripped != email {
        Some(stripped)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_dollar_and_trims() {
        assert_eq!(sanitize_string("  $where: 1  "), "where: 1");
    }

    #[test]
    fn sanitize_keeps_dots_intact() {
        assert_eq!(sanitize_string("user.name@example.com"), "user.name@example.com");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(5000);
        assert_eq!(sanitize_string(&long).len(), MAX_TEXT_LEN);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("user.name+tag@sub.domain.in"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two@@signs.com"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spa ce@x.com"));
    }

    #[test]
    fn legacy_email_only_when_dots_present() {
        assert_eq!(
            legacy_dotless_email("a.b@c.in").as_deref(),
            Some("ab@cin")
        );
        assert_eq!(legacy_dotless_email("ab@cin"), None);
    }
}
