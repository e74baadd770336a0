//! Built-in report definitions

use smartsales_core::types::{ListQuery, OrderingState};
use smartsales_core::utils::REPORT_DATETIME_FORMAT;

use crate::column::{ColumnDescriptor, ColumnKind, ColumnRegistry, ExportSelection};
use crate::job::{ExportCap, ReportMeta};
use crate::runner::ExportRequest;

/// Everything needed to list and export one kind of record
#[derive(Debug, Clone)]
pub struct ReportDefinition {
    /// Short name used on the command line
    pub name: &'static str,
    pub meta: ReportMeta,
    pub endpoint: &'static str,
    /// Ordering applied to both the list and the export fetch
    pub ordering: OrderingState,
    pub registry: ColumnRegistry,
    /// Filter keys the report screen offers
    pub filter_keys: &'static [&'static str],
    default_columns: &'static [&'static str],
}

impl ReportDefinition {
    /// Product catalogue report
    pub fn products() -> Self {
        let registry = ColumnRegistry::from_declared(vec![
            ColumnDescriptor::new("id", "ID").kind(ColumnKind::Number),
            ColumnDescriptor::new("nombre", "Nombre").sort_key("nombre"),
            ColumnDescriptor::new("codigo_referencia", "SKU/Ref."),
            ColumnDescriptor::new("precio", "Precio (Bs.)")
                .kind(ColumnKind::Currency)
                .sort_key("precio"),
            ColumnDescriptor::new("stock", "Stock")
                .kind(ColumnKind::Number)
                .sort_key("stock"),
            ColumnDescriptor::new("estado", "Estado")
                .kind(ColumnKind::boolean("Activo", "Inactivo")),
            ColumnDescriptor::new("marca", "Marca").accessor("marca.nombre"),
            ColumnDescriptor::new("categorias", "Categorías").kind(ColumnKind::join("nombre")),
            ColumnDescriptor::new("tienda", "Tienda"),
            ColumnDescriptor::new("descripcion", "Descripción"),
        ]);

        Self {
            name: "products",
            meta: ReportMeta {
                filename_base: "Reporte_Productos".to_string(),
                title: "Reporte de Productos".to_string(),
                sheet_name: "Productos".to_string(),
            },
            endpoint: "/comercial/productos/",
            ordering: OrderingState::asc("nombre"),
            registry,
            filter_keys: &["precio__gte", "precio__lte", "estado", "marca", "categorias"],
            default_columns: &[
                "nombre",
                "codigo_referencia",
                "precio",
                "stock",
                "estado",
                "marca",
                "categorias",
            ],
        }
    }

    /// Registered users report
    pub fn users() -> Self {
        let registry = ColumnRegistry::from_declared(vec![
            ColumnDescriptor::new("id_usuario", "ID").kind(ColumnKind::Number),
            ColumnDescriptor::new("email", "Correo").sort_key("email"),
            ColumnDescriptor::new("nombre", "Nombre")
                .accessor("profile.nombre")
                .sort_key("profile__nombre"),
            ColumnDescriptor::new("apellido", "Apellido")
                .accessor("profile.apellido")
                .sort_key("profile__apellido"),
            ColumnDescriptor::new("ci", "CI").accessor("profile.ci"),
            ColumnDescriptor::new("telefono", "Teléfono").accessor("profile.telefono"),
            ColumnDescriptor::new("rol", "Rol")
                .accessor("rol.nombre")
                .kind(ColumnKind::labels(&[
                    ("superAdmin", "Super Administrador"),
                    ("admin", "Administrador"),
                    ("cliente", "Cliente"),
                    ("vendedor", "Vendedor"),
                ])),
            ColumnDescriptor::new("genero", "Género")
                .accessor("profile.genero")
                .kind(ColumnKind::labels(&[
                    ("MASCULINO", "Masculino"),
                    ("FEMENINO", "Femenino"),
                    ("OTRO", "Otro"),
                ])),
            ColumnDescriptor::new("fecha_creacion", "Fecha Registro")
                .kind(ColumnKind::datetime(REPORT_DATETIME_FORMAT))
                .sort_key("fecha_creacion"),
        ]);

        Self {
            name: "users",
            meta: ReportMeta {
                filename_base: "Reporte_Usuarios".to_string(),
                title: "Reporte de Usuarios".to_string(),
                sheet_name: "Usuarios".to_string(),
            },
            endpoint: "/usuarios/users/",
            ordering: OrderingState::desc("fecha_creacion"),
            registry,
            filter_keys: &["fecha_creacion__gte", "fecha_creacion__lte"],
            default_columns: &["email", "nombre", "apellido", "rol", "telefono"],
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::products(), Self::users()]
    }

    pub fn by_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|report| report.name == name)
    }

    /// Columns selected when the report opens
    pub fn default_selection(&self) -> ExportSelection {
        ExportSelection::from_keys(self.default_columns.iter().copied())
    }

    /// First-page query for this report's endpoint and ordering
    pub fn base_query(&self, page_size: u32) -> smartsales_core::Result<ListQuery> {
        Ok(ListQuery::new(self.endpoint, page_size)?.with_ordering(self.ordering.clone()))
    }

    /// Export request over `query` with this report's columns
    pub fn request<'a>(
        &'a self,
        query: &'a ListQuery,
        selection: &'a ExportSelection,
        cap: ExportCap,
    ) -> ExportRequest<'a> {
        ExportRequest {
            query,
            registry: &self.registry,
            selection,
            meta: &self.meta,
            cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ExportCell;
    use crate::projection::project;
    use serde_json::json;

    #[test]
    fn test_builtin_registries_are_valid() {
        for report in ReportDefinition::all() {
            let columns = report.registry.columns().to_vec();
            assert!(ColumnRegistry::new(columns).is_ok(), "{}", report.name);
            assert!(report.default_selection().unknown_keys(&report.registry).is_empty());
        }
        assert!(ReportDefinition::by_name("products").is_some());
        assert!(ReportDefinition::by_name("ventas").is_none());
    }

    #[test]
    fn test_product_defaults() {
        let report = ReportDefinition::products();
        let row = json!({
            "id": 7,
            "nombre": "Silla ergonómica",
            "codigo_referencia": "",
            "precio": "1250.5",
            "stock": 3,
            "estado": false,
            "marca": null,
            "categorias": [{"nombre": "Sillas"}, {"nombre": "Oficina"}],
            "tienda": "Central"
        });

        let projection = project(&[row], &report.registry, &report.default_selection()).unwrap();
        assert_eq!(
            projection.headers,
            vec!["Nombre", "SKU/Ref.", "Precio (Bs.)", "Stock", "Estado", "Marca", "Categorías"]
        );
        assert_eq!(
            projection.body[0],
            vec![
                ExportCell::text("Silla ergonómica"),
                ExportCell::Missing,
                ExportCell::currency(1250.5),
                ExportCell::number(3.0),
                ExportCell::text("Inactivo"),
                ExportCell::Missing,
                ExportCell::text("Sillas, Oficina"),
            ]
        );

        let query = report.base_query(10).unwrap();
        assert_eq!(query.ordering.to_token().as_deref(), Some("nombre"));
    }

    #[test]
    fn test_user_columns() {
        let report = ReportDefinition::users();
        let row = json!({
            "id_usuario": 3,
            "email": "ana@example.com",
            "rol": {"nombre": "vendedor"},
            "profile": {"nombre": "Ana", "apellido": "Rojas", "genero": "FEMENINO"},
            "fecha_creacion": "2025-11-13T10:15:30Z"
        });

        let selection = ExportSelection::from_keys(["fecha_creacion", "genero", "rol", "ci"]);
        let projection = project(&[row], &report.registry, &selection).unwrap();

        assert_eq!(projection.headers, vec!["CI", "Rol", "Género", "Fecha Registro"]);
        assert_eq!(
            projection.body[0],
            vec![
                ExportCell::Missing,
                ExportCell::text("Vendedor"),
                ExportCell::text("Femenino"),
                ExportCell::text("13/11/2025 10:15:30"),
            ]
        );

        let query = report.base_query(10).unwrap();
        assert_eq!(query.ordering.to_token().as_deref(), Some("-fecha_creacion"));
    }
}
