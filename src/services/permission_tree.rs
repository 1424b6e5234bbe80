// src/services/permission_tree.rs
//
// Regras puras do RBAC (sem banco): plano de seeding por template,
// política de AllowedAction e montagem das árvores de sidebar/configuração.

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::models::catalog::{
    ACTION_CREATE, ACTION_DELETE, ACTION_EDIT, ACTION_EXPORT, ACTION_STATUS, ACTION_VIEW,
};
use crate::models::rbac::{
    ActionRef, CatalogRow, ConfigModule, ConfigSection, ConfigSubmodule, PermissionGrant,
    PermissionTarget, RoleTemplate, SidebarModule, SidebarRow, SidebarSection, SidebarSubmodule,
};

const VENTAS_SECTIONS: [&str; 2] = ["ventas", "almacen"];
const ALMACEN_SECTIONS: [&str; 1] = ["almacen"];
const VENDEDOR_MODULES: [&str; 4] = ["ventas", "caja", "cotizaciones", "devoluciones"];
const ADMIN_EXCLUDED_ACTIONS: [&str; 2] = [ACTION_DELETE, ACTION_EXPORT];

/// Ações liberadas por padrão: em submódulos quando o módulo os tem, senão no próprio módulo.
pub fn default_allowed_actions(module_has_submodules: bool) -> &'static [&'static str] {
    if module_has_submodules {
        &[ACTION_VIEW, ACTION_EXPORT]
    } else {
        &[ACTION_VIEW, ACTION_CREATE, ACTION_EDIT, ACTION_STATUS]
    }
}

/// O template só enxerga seções ocultas (System.Admin) ou só as visíveis.
pub fn template_uses_hidden_sections(template: RoleTemplate) -> bool {
    template == RoleTemplate::SystemAdmin
}

fn template_includes(template: RoleTemplate, row: &CatalogRow, action_key: &str) -> bool {
    let section = row.section_key.as_str();
    let module = row.module_key.as_str();

    match template {
        RoleTemplate::SystemAdmin => !row.section_visibility,
        // Demais templates nunca recebem seções de sistema
        _ if !row.section_visibility => false,
        RoleTemplate::SuperAdmin => true,
        RoleTemplate::Admin => !ADMIN_EXCLUDED_ACTIONS.contains(&action_key),
        RoleTemplate::Ventas => VENTAS_SECTIONS.contains(&section),
        RoleTemplate::Almacen => ALMACEN_SECTIONS.contains(&section),
        RoleTemplate::Vendedor => VENDEDOR_MODULES.contains(&module),
        RoleTemplate::Custom => false,
    }
}

/// Concessões que o template recebe a partir das linhas de AllowedAction do catálogo.
///
/// Cada ação permitida vira uma linha por nível presente: seção, módulo e, se houver,
/// submódulo. O resultado é ordenado e sem duplicatas.
pub fn plan_role_permissions(template: RoleTemplate, rows: &[CatalogRow]) -> Vec<PermissionGrant> {
    let mut grants = BTreeSet::new();

    for row in rows {
        let (Some(action_id), Some(action_key)) = (row.action_id, row.action_key.as_deref()) else {
            continue;
        };
        if !template_includes(template, row, action_key) {
            continue;
        }

        grants.insert(PermissionGrant {
            action_id,
            target: PermissionTarget::Section { section_id: row.section_id },
        });
        grants.insert(PermissionGrant {
            action_id,
            target: PermissionTarget::Module {
                section_id: row.section_id,
                module_id: row.module_id,
            },
        });
        if let Some(submodule_id) = row.submodule_id {
            grants.insert(PermissionGrant {
                action_id,
                target: PermissionTarget::Submodule {
                    section_id: row.section_id,
                    module_id: row.module_id,
                    submodule_id,
                },
            });
        }
    }

    grants.into_iter().collect()
}

/// Monta Seção → Módulo → Submódulo a partir das permissões "ver", sem repetir ids.
/// Mantém a ordem de chegada das linhas e ordena as seções por `order`.
pub fn build_sidebar(rows: Vec<SidebarRow>) -> Vec<SidebarSection> {
    let mut sections: Vec<SidebarSection> = Vec::new();
    let mut section_idx: HashMap<Uuid, usize> = HashMap::new();
    let mut module_idx: HashMap<Uuid, (usize, usize)> = HashMap::new();

    for row in rows {
        let s = *section_idx.entry(row.section_id).or_insert_with(|| {
            sections.push(SidebarSection {
                id: row.section_id,
                name: row.section_name.clone(),
                order: row.section_order,
                modules: Vec::new(),
            });
            sections.len() - 1
        });

        let Some(module_id) = row.module_id else {
            continue;
        };

        let (s, m) = *module_idx.entry(module_id).or_insert_with(|| {
            let modules = &mut sections[s].modules;
            modules.push(SidebarModule {
                id: module_id,
                name: row.module_name.clone().unwrap_or_default(),
                route: row.module_route.clone(),
                icon_name: row.module_icon.clone(),
                submodules: Vec::new(),
            });
            (s, modules.len() - 1)
        });

        if let Some(submodule_id) = row.submodule_id {
            let submodules = &mut sections[s].modules[m].submodules;
            if !submodules.iter().any(|sm| sm.id == submodule_id) {
                submodules.push(SidebarSubmodule {
                    id: submodule_id,
                    name: row.submodule_name.unwrap_or_default(),
                    route: row.submodule_route,
                });
            }
        }
    }

    sections.sort_by_key(|s| s.order);
    sections
}

/// Árvore de configuração: todas as seções do tipo pedido com as ações permitidas,
/// no submódulo quando existe, senão no módulo.
pub fn build_configuration_tree(rows: Vec<CatalogRow>, hidden_sections: bool) -> Vec<ConfigSection> {
    let mut sections: Vec<ConfigSection> = Vec::new();
    let mut section_idx: HashMap<Uuid, usize> = HashMap::new();
    let mut module_idx: HashMap<Uuid, (usize, usize)> = HashMap::new();

    for row in rows.into_iter().filter(|r| r.section_visibility != hidden_sections) {
        let s = *section_idx.entry(row.section_id).or_insert_with(|| {
            sections.push(ConfigSection {
                id: row.section_id,
                name: row.section_name.clone(),
                order: row.section_order,
                modules: Vec::new(),
            });
            sections.len() - 1
        });

        let (s, m) = *module_idx.entry(row.module_id).or_insert_with(|| {
            let modules = &mut sections[s].modules;
            modules.push(ConfigModule {
                id: row.module_id,
                name: row.module_name.clone(),
                actions: Vec::new(),
                submodules: Vec::new(),
            });
            (s, modules.len() - 1)
        });

        let action = match (row.action_id, row.action_name) {
            (Some(id), Some(name)) => Some(ActionRef { id, name }),
            _ => None,
        };
        let module = &mut sections[s].modules[m];

        match row.submodule_id {
            Some(submodule_id) => {
                let pos = match module.submodules.iter().position(|sm| sm.id == submodule_id) {
                    Some(pos) => pos,
                    None => {
                        module.submodules.push(ConfigSubmodule {
                            id: submodule_id,
                            name: row.submodule_name.unwrap_or_default(),
                            actions: Vec::new(),
                        });
                        module.submodules.len() - 1
                    }
                };
                push_action(&mut module.submodules[pos].actions, action);
            }
            None => push_action(&mut module.actions, action),
        }
    }

    sections.sort_by_key(|s| s.order);
    sections
}

fn push_action(actions: &mut Vec<ActionRef>, action: Option<ActionRef>) {
    if let Some(action) = action {
        if !actions.iter().any(|a| a.id == action.id) {
            actions.push(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::normalize::{normalize, NameKind};

    struct Ids {
        ver: Uuid,
        crear: Uuid,
        eliminar: Uuid,
        exportar: Uuid,
    }

    fn ids() -> Ids {
        Ids {
            ver: Uuid::new_v4(),
            crear: Uuid::new_v4(),
            eliminar: Uuid::new_v4(),
            exportar: Uuid::new_v4(),
        }
    }

    fn catalog_row(
        section: (Uuid, &str, bool),
        module: (Uuid, &str),
        submodule: Option<(Uuid, &str)>,
        action: Option<(Uuid, &str)>,
    ) -> CatalogRow {
        CatalogRow {
            section_id: section.0,
            section_name: section.1.to_string(),
            section_key: normalize(section.1, NameKind::Catalog),
            section_order: 0,
            section_visibility: section.2,
            module_id: module.0,
            module_name: module.1.to_string(),
            module_key: normalize(module.1, NameKind::Catalog),
            submodule_id: submodule.map(|s| s.0),
            submodule_name: submodule.map(|s| s.1.to_string()),
            action_id: action.map(|a| a.0),
            action_name: action.map(|a| a.1.to_string()),
            action_key: action.map(|a| normalize(a.1, NameKind::Catalog)),
        }
    }

    fn sidebar_row(
        section: (Uuid, &str, i32),
        module: Option<Uuid>,
        submodule: Option<Uuid>,
    ) -> SidebarRow {
        SidebarRow {
            section_id: section.0,
            section_name: section.1.to_string(),
            section_order: section.2,
            module_id: module,
            module_name: module.map(|_| "mod".to_string()),
            module_route: None,
            module_icon: None,
            submodule_id: submodule,
            submodule_name: submodule.map(|_| "sub".to_string()),
            submodule_route: None,
        }
    }

    #[test]
    fn allowed_action_policy_depends_on_submodules() {
        assert_eq!(default_allowed_actions(true), &["ver", "exportar"]);
        assert_eq!(default_allowed_actions(false), &["ver", "crear", "editar", "estado"]);
    }

    #[test]
    fn plan_fans_out_one_row_per_level() {
        let a = ids();
        let ventas = (Uuid::new_v4(), "Ventas", true);
        let reportes = (Uuid::new_v4(), "Reportes", true);
        let caja = (Uuid::new_v4(), "Caja");
        let informes = (Uuid::new_v4(), "Informes");
        let diario = (Uuid::new_v4(), "Diario");

        let rows = vec![
            catalog_row(ventas, caja, None, Some((a.ver, "ver"))),
            catalog_row(reportes, informes, Some(diario), Some((a.ver, "ver"))),
        ];
        let plan = plan_role_permissions(RoleTemplate::SuperAdmin, &rows);

        // Caja: seção + módulo; Diario: seção + módulo + submódulo
        assert_eq!(plan.len(), 5);
        assert!(plan.contains(&PermissionGrant {
            action_id: a.ver,
            target: PermissionTarget::Submodule {
                section_id: reportes.0,
                module_id: informes.0,
                submodule_id: diario.0,
            },
        }));
    }

    #[test]
    fn plan_deduplicates_shared_levels() {
        let a = ids();
        let reportes = (Uuid::new_v4(), "Reportes", true);
        let informes = (Uuid::new_v4(), "Informes");
        let rows = vec![
            catalog_row(reportes, informes, Some((Uuid::new_v4(), "Diario")), Some((a.ver, "ver"))),
            catalog_row(reportes, informes, Some((Uuid::new_v4(), "Mensual")), Some((a.ver, "ver"))),
        ];
        let plan = plan_role_permissions(RoleTemplate::SuperAdmin, &rows);
        // 1 seção + 1 módulo + 2 submódulos
        assert_eq!(plan.len(), 4);
        // Rodar de novo dá exatamente o mesmo conjunto
        assert_eq!(plan, plan_role_permissions(RoleTemplate::SuperAdmin, &rows));
    }

    #[test]
    fn system_and_super_admin_split_by_visibility() {
        let a = ids();
        let config = (Uuid::new_v4(), "Configuracion", false);
        let ventas = (Uuid::new_v4(), "Ventas", true);
        let rows = vec![
            catalog_row(config, (Uuid::new_v4(), "Secciones"), None, Some((a.ver, "ver"))),
            catalog_row(ventas, (Uuid::new_v4(), "Caja"), None, Some((a.ver, "ver"))),
        ];

        let system = plan_role_permissions(RoleTemplate::SystemAdmin, &rows);
        assert!(system.iter().all(|g| g.target.section_id() == config.0));
        assert_eq!(system.len(), 2);

        let super_admin = plan_role_permissions(RoleTemplate::SuperAdmin, &rows);
        assert!(super_admin.iter().all(|g| g.target.section_id() == ventas.0));
        assert_eq!(super_admin.len(), 2);
    }

    #[test]
    fn admin_excludes_delete_and_export() {
        let a = ids();
        let ventas = (Uuid::new_v4(), "Ventas", true);
        let caja = (Uuid::new_v4(), "Caja");
        let rows = vec![
            catalog_row(ventas, caja, None, Some((a.ver, "ver"))),
            catalog_row(ventas, caja, None, Some((a.crear, "crear"))),
            catalog_row(ventas, caja, None, Some((a.eliminar, "eliminar"))),
            catalog_row(ventas, caja, None, Some((a.exportar, "Exportar"))),
        ];
        let plan = plan_role_permissions(RoleTemplate::Admin, &rows);
        let actions: BTreeSet<Uuid> = plan.iter().map(|g| g.action_id).collect();
        assert_eq!(actions, BTreeSet::from([a.ver, a.crear]));
    }

    #[test]
    fn curated_templates_filter_by_section_or_module() {
        let a = ids();
        let ventas = (Uuid::new_v4(), "Ventas", true);
        let almacen = (Uuid::new_v4(), "Almacén", true);
        let gastos = (Uuid::new_v4(), "Gastos", true);
        let cotizaciones = (Uuid::new_v4(), "Cotizaciones");
        let productos = (Uuid::new_v4(), "Productos");
        let rows = vec![
            catalog_row(ventas, cotizaciones, None, Some((a.ver, "ver"))),
            catalog_row(almacen, productos, None, Some((a.ver, "ver"))),
            catalog_row(gastos, (Uuid::new_v4(), "Gastos"), None, Some((a.ver, "ver"))),
        ];

        let sections = |t| -> BTreeSet<Uuid> {
            plan_role_permissions(t, &rows).iter().map(|g| g.target.section_id()).collect()
        };
        assert_eq!(sections(RoleTemplate::Ventas), BTreeSet::from([ventas.0, almacen.0]));
        assert_eq!(sections(RoleTemplate::Almacen), BTreeSet::from([almacen.0]));
        assert_eq!(sections(RoleTemplate::Vendedor), BTreeSet::from([ventas.0]));
        assert!(plan_role_permissions(RoleTemplate::Custom, &rows).is_empty());
    }

    #[test]
    fn templates_match_stored_keys_not_display_names() {
        let a = ids();
        let mut row = catalog_row(
            (Uuid::new_v4(), "Depósito Central", true),
            (Uuid::new_v4(), "Estoque"),
            None,
            Some((a.ver, "Visualizar")),
        );
        row.section_key = "almacen".into();
        row.action_key = Some("eliminar".into());

        assert_eq!(plan_role_permissions(RoleTemplate::Almacen, &[row.clone()]).len(), 2);
        assert!(plan_role_permissions(RoleTemplate::Admin, &[row]).is_empty());
    }

    #[test]
    fn rows_without_allowed_action_grant_nothing() {
        let ventas = (Uuid::new_v4(), "Ventas", true);
        let rows = vec![catalog_row(ventas, (Uuid::new_v4(), "Caja"), None, None)];
        assert!(plan_role_permissions(RoleTemplate::SuperAdmin, &rows).is_empty());
    }

    #[test]
    fn sidebar_merges_module_and_submodule_grants() {
        let section = (Uuid::new_v4(), "Ventas", 1);
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let s1 = Uuid::new_v4();

        let tree = build_sidebar(vec![
            sidebar_row(section, Some(m1), None),
            sidebar_row(section, Some(m2), Some(s1)),
        ]);

        assert_eq!(tree.len(), 1);
        let modules = &tree[0].modules;
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].id, m1);
        assert!(modules[0].submodules.is_empty());
        assert_eq!(modules[1].id, m2);
        assert_eq!(modules[1].submodules.len(), 1);
        assert_eq!(modules[1].submodules[0].id, s1);
    }

    #[test]
    fn sidebar_deduplicates_every_level() {
        let section = (Uuid::new_v4(), "Reportes", 2);
        let m = Uuid::new_v4();
        let s = Uuid::new_v4();
        let tree = build_sidebar(vec![
            sidebar_row(section, None, None),
            sidebar_row(section, Some(m), None),
            sidebar_row(section, Some(m), Some(s)),
            sidebar_row(section, Some(m), Some(s)),
        ]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].modules.len(), 1);
        assert_eq!(tree[0].modules[0].submodules.len(), 1);
    }

    #[test]
    fn sidebar_with_section_grant_only_has_no_modules() {
        let section = (Uuid::new_v4(), "Ventas", 1);
        let tree = build_sidebar(vec![sidebar_row(section, None, None)]);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].modules.is_empty());
    }

    #[test]
    fn sidebar_sections_sorted_by_order() {
        let late = (Uuid::new_v4(), "Reportes", 5);
        let early = (Uuid::new_v4(), "Ventas", 1);
        let tree = build_sidebar(vec![sidebar_row(late, None, None), sidebar_row(early, None, None)]);
        assert_eq!(tree[0].id, early.0);
        assert_eq!(tree[1].id, late.0);
    }

    #[test]
    fn configuration_tree_places_actions_on_the_right_level() {
        let a = ids();
        let ventas = (Uuid::new_v4(), "Ventas", true);
        let config = (Uuid::new_v4(), "Configuracion", false);
        let caja = (Uuid::new_v4(), "Caja");
        let reportes = (Uuid::new_v4(), "Reportes");
        let diario = (Uuid::new_v4(), "Diario");

        let rows = vec![
            catalog_row(ventas, caja, None, Some((a.ver, "ver"))),
            catalog_row(ventas, caja, None, Some((a.crear, "crear"))),
            catalog_row(ventas, reportes, Some(diario), Some((a.ver, "ver"))),
            catalog_row(ventas, reportes, Some(diario), Some((a.exportar, "exportar"))),
            catalog_row(config, (Uuid::new_v4(), "Secciones"), None, Some((a.ver, "ver"))),
        ];

        let visible = build_configuration_tree(rows.clone(), false);
        assert_eq!(visible.len(), 1);
        let modules = &visible[0].modules;
        assert_eq!(modules[0].actions.len(), 2);
        assert!(modules[0].submodules.is_empty());
        assert!(modules[1].actions.is_empty());
        assert_eq!(modules[1].submodules[0].actions.len(), 2);

        let hidden = build_configuration_tree(rows, true);
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].id, config.0);
    }
}
