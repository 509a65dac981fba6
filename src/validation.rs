// 📐 Form Validation - required fields for equipment records
// Every field except the image must be filled in before a record is saved.

use crate::db::Equipo;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// EQUIPO VALIDATOR
// ============================================================================

pub struct EquipoValidator;

impl EquipoValidator {
    pub fn new() -> Self {
        EquipoValidator
    }

    /// Validate a record before saving. Required and non-blank: modelo,
    /// descripcion, numero_serie, estado, categoria. The image reference is
    /// optional. Category strings are not normalized here beyond being
    /// non-blank; casing is preserved as typed.
    pub fn validate(&self, equipo: &Equipo) -> ValidationResult {
        let mut errors = Vec::new();

        let required = [
            ("modelo", &equipo.modelo),
            ("descripcion", &equipo.descripcion),
            ("numero_serie", &equipo.numero_serie),
            ("estado", &equipo.estado),
            ("categoria", &equipo.categoria),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "Required field is empty".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for EquipoValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Equipo {
        Equipo::new(
            "MacBook Pro".to_string(),
            "Portátil de desarrollo".to_string(),
            "SN-001".to_string(),
            "Operativo".to_string(),
            "laptop".to_string(),
            None,
        )
    }

    #[test]
    fn test_complete_record_passes() {
        let validator = EquipoValidator::new();
        assert!(validator.validate(&complete()).is_ok());
    }

    #[test]
    fn test_image_is_optional() {
        let validator = EquipoValidator::new();
        let mut equipo = complete();
        equipo.imagen = Some("file:///fotos/equipo.jpg".to_string());
        assert!(validator.validate(&equipo).is_ok());
    }

    #[test]
    fn test_missing_modelo_is_reported() {
        let validator = EquipoValidator::new();
        let mut equipo = complete();
        equipo.modelo = String::new();

        let errors = validator.validate(&equipo).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "modelo");
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let validator = EquipoValidator::new();
        let mut equipo = complete();
        equipo.categoria = "   ".to_string();

        let errors = validator.validate(&equipo).unwrap_err();
        assert_eq!(errors[0].field, "categoria");
    }

    #[test]
    fn test_all_errors_are_collected() {
        let validator = EquipoValidator::new();
        let equipo = Equipo::new(
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            None,
        );

        let errors = validator.validate(&equipo).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["modelo", "descripcion", "numero_serie", "estado", "categoria"]
        );
    }
}
