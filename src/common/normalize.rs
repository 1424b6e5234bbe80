// src/common/normalize.rs

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::common::error::AppError;

/// Alfabeto permitido para cada tipo de nome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// Seções, módulos, submódulos e ações: só letras (e espaço).
    Catalog,
    /// Letras, dígitos, `.`, `,`, `-` e espaço.
    Tenant,
    /// Mesmo alfabeto do tenant.
    Subsidiary,
    /// Letras, dígitos, `.` e espaço ("System.Admin").
    Role,
    /// Letras, dígitos e `.`, sem espaço.
    Username,
}

impl NameKind {
    fn allows(self, c: char) -> bool {
        match self {
            NameKind::Catalog => c.is_ascii_alphabetic() || c == ' ',
            NameKind::Tenant | NameKind::Subsidiary => {
                c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '-' | ' ')
            }
            NameKind::Role => c.is_ascii_alphanumeric() || matches!(c, '.' | ' '),
            NameKind::Username => c.is_ascii_alphanumeric() || c == '.',
        }
    }
}

/// Forma canônica usada nas comparações de unicidade.
///
/// Remove acentos (decomposição NFD, `ñ` vira `n`), passa para minúsculas,
/// descarta o que estiver fora do alfabeto do tipo e colapsa espaços.
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str, kind: NameKind) -> String {
    let filtered: String = raw
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| kind.allows(*c))
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Par (nome de exibição, chave normalizada) de um nome vindo do cliente.
/// Falha com erro de validação em `field` se a chave ficar vazia.
pub fn keyed_name(raw: &str, kind: NameKind, field: &'static str) -> Result<(String, String), AppError> {
    let key = normalize(raw, kind);
    if key.is_empty() {
        return Err(AppError::field(
            field,
            "alphabet",
            "O nome não contém caracteres válidos.",
        ));
    }
    Ok((display_name(raw), key))
}

/// Nome de exibição: sem espaços nas pontas e com espaços internos colapsados.
pub fn display_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [NameKind; 5] = [
        NameKind::Catalog,
        NameKind::Tenant,
        NameKind::Subsidiary,
        NameKind::Role,
        NameKind::Username,
    ];

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize("  Configuración ", NameKind::Catalog), "configuracion");
        assert_eq!(normalize("Año Contable", NameKind::Catalog), "ano contable");
        assert_eq!(normalize("ÉXITO S.A.", NameKind::Tenant), "exito s.a.");
    }

    #[test]
    fn catalog_names_keep_only_letters() {
        assert_eq!(normalize("Ventas 2024!", NameKind::Catalog), "ventas");
        assert_eq!(normalize("Notas   de\tCrédito", NameKind::Catalog), "notas de credito");
    }

    #[test]
    fn tenant_alphabet_keeps_digits_and_punctuation() {
        assert_eq!(normalize("Acme, Inc. - 2", NameKind::Tenant), "acme, inc. - 2");
        assert_eq!(normalize("Acme_Corp#1", NameKind::Tenant), "acmecorp1");
    }

    #[test]
    fn usernames_drop_spaces() {
        assert_eq!(normalize(" Luis Peña.2 ", NameKind::Username), "luispena.2");
        assert_eq!(normalize("System.Admin", NameKind::Username), "system.admin");
    }

    #[test]
    fn role_names_keep_dot() {
        assert_eq!(normalize("Super.Admin", NameKind::Role), "super.admin");
        assert_eq!(normalize("Jefe de  Almacén", NameKind::Role), "jefe de almacen");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "  Configuración ",
            "ÑANDÚ   Perú",
            "Acme, Inc. - 2",
            "a\u{0301}b\u{0308}c",
            "System.Admin",
            "   ",
            "Ventas 2024!",
            "ß straße",
        ];
        for kind in ALL_KINDS {
            for raw in samples {
                let once = normalize(raw, kind);
                assert_eq!(normalize(&once, kind), once, "kind={kind:?} raw={raw:?}");
            }
        }
    }

    #[test]
    fn equivalent_inputs_collide() {
        assert_eq!(normalize("Almacén", NameKind::Catalog), normalize("ALMACEN", NameKind::Catalog));
        assert_eq!(normalize("luis", NameKind::Username), normalize(" Luís ", NameKind::Username));
        assert_ne!(normalize("Ventas", NameKind::Catalog), normalize("Caja", NameKind::Catalog));
    }

    #[test]
    fn keyed_name_rejects_empty_keys() {
        let (display, key) = keyed_name("  Casa  Matriz ", NameKind::Subsidiary, "name").unwrap();
        assert_eq!((display.as_str(), key.as_str()), ("Casa Matriz", "casa matriz"));
        assert!(matches!(
            keyed_name("2024 !!", NameKind::Catalog, "name"),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn display_name_collapses_whitespace() {
        assert_eq!(display_name("  Casa   Matriz \n"), "Casa Matriz");
    }
}
