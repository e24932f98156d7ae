//! User-facing reply texts

use crate::domain::entities::CustomerProfile;

pub const CUSTOMER_NOT_FOUND: &str = "❌ Cliente no encontrado en el sistema.";
pub const LOOKUP_FAILED: &str = "⚠️ Error al consultar información. Intente nuevamente.";
pub const DISCOUNT_FORMAT_ERROR: &str = "❌ Formato incorrecto. Use: DESCUENTO 10";
pub const DISCOUNT_REJECTED: &str =
    "❌ Error al actualizar descuento. Verifique que el cliente exista.";
pub const DISCOUNT_FAILED: &str = "⚠️ Error al procesar solicitud. Intente nuevamente.";

pub const HELP: &str = "🤖 *Comandos disponibles:*\n\n\
📋 CONSULTAR - Ver tu información\n\
💰 DESCUENTO [%] - Actualizar descuento\n\
❓ AYUDA - Ver este mensaje\n\n\
Ejemplo: DESCUENTO 15";

pub const GREETING: &str = "¡Hola! 👋\n\nEnvía *AYUDA* para ver los comandos disponibles.";

pub fn customer_summary(profile: &CustomerProfile) -> String {
    format!(
        "📋 *Información del Cliente*\n\n\
         Nombre: {}\n\
         Teléfono: {}\n\
         Descuento actual: {}%\n\
         Estado: {}",
        profile.nombre, profile.telefono, profile.descuento, profile.estado
    )
}

pub fn discount_updated(value: &str, phone: &str) -> String {
    format!(
        "✅ *Descuento actualizado*\n\n\
         Nuevo descuento: {}%\n\
         Teléfono: {}",
        value, phone
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_field() {
        let profile = CustomerProfile {
            nombre: "Ana".to_string(),
            telefono: "595981234567".to_string(),
            descuento: 10.0,
            estado: "ACTIVO".to_string(),
        };
        let text = customer_summary(&profile);

        assert!(text.contains("Nombre: Ana"));
        assert!(text.contains("Teléfono: 595981234567"));
        assert!(text.contains("Descuento actual: 10%"));
        assert!(text.contains("Estado: ACTIVO"));
    }

    #[test]
    fn help_lists_commands() {
        for cmd in ["CONSULTAR", "DESCUENTO", "AYUDA"] {
            assert!(HELP.contains(cmd));
        }
    }
}
