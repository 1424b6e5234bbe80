// Testes contra um Postgres real. Rodam só com `--features pg-tests` e DATABASE_URL definida.
#![cfg(feature = "pg-tests")]

use business_core::{
    common::{error::AppError, pagination::ListQuery},
    config::AppState,
    models::{
        auth::{CallerIdentity, CreateUserPayload, LoginUserPayload},
        catalog::{CreateAllowedActionPayload, CreateSectionPayload, PermissionAction, Section},
        rbac::{CreateRolePayload, CreateRolePermissionPayload, Role, RoleTemplate, SYSTEM_ADMIN_ROLE_ID},
        schedule::{ScheduleOwner, ScheduleWindow, Weekday},
        tenancy::{CreateSubsidiaryPayload, CreateTenantPayload, Subsidiary, SubsidiaryType, Tenant, GLOBAL_SUBSIDIARY_ID},
    },
};
use chrono::NaiveTime;
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const ADMIN_PASSWORD: &str = "admin123";

async fn setup() -> Option<AppState> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL não definida; pulando teste de integração");
        return None;
    };
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    let state = AppState::from_pool(pool, "segredo-de-teste".into(), 1);
    state.seed_service.run(Some(ADMIN_PASSWORD)).await.unwrap();
    Some(state)
}

fn admin() -> CallerIdentity {
    CallerIdentity {
        id: Uuid::new_v4(),
        username: "system.admin".into(),
        role_id: SYSTEM_ADMIN_ROLE_ID,
        tenant_id: None,
        subsidiary_id: GLOBAL_SUBSIDIARY_ID,
    }
}

fn tenant_user(tenant_id: Uuid) -> CallerIdentity {
    CallerIdentity {
        id: Uuid::new_v4(),
        username: "gerente".into(),
        role_id: Uuid::new_v4(),
        tenant_id: Some(tenant_id),
        subsidiary_id: Uuid::new_v4(),
    }
}

/// Sufixo alfanumérico para os nomes não colidirem entre execuções.
fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Sufixo só de letras (alfabeto do catálogo).
fn letters() -> String {
    suffix()
        .chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from(b'g' + d as u8),
            None => c,
        })
        .collect()
}

async fn tenant(state: &AppState, name: &str, max_subsidiaries: i32) -> Tenant {
    state
        .tenant_service
        .create_tenant(
            &admin(),
            CreateTenantPayload { name: name.into(), max_subsidiaries, max_users: 10, max_roles: 10 },
        )
        .await
        .unwrap()
}

async fn subsidiary(state: &AppState, tenant_id: Uuid, name: &str) -> Subsidiary {
    state
        .tenant_service
        .create_subsidiary(
            &admin(),
            CreateSubsidiaryPayload {
                tenant_id,
                name: name.into(),
                subsidiary_type: SubsidiaryType::Matriz,
                allow_negative_stock: false,
            },
        )
        .await
        .unwrap()
}

async fn role(state: &AppState, subsidiary: &Subsidiary, name: &str, template: RoleTemplate) -> Role {
    state
        .rbac_service
        .create_role(
            &admin(),
            CreateRolePayload {
                name: name.into(),
                tenant_id: subsidiary.tenant_id,
                subsidiary_id: subsidiary.id,
                template,
            },
        )
        .await
        .unwrap()
}

fn user_payload(username: &str, role: &Role) -> CreateUserPayload {
    CreateUserPayload {
        username: username.into(),
        password: "segredo123".into(),
        role_id: role.id,
        subsidiary_id: role.subsidiary_id,
    }
}

async fn section_by_key(state: &AppState, key: &str) -> Section {
    let query = ListQuery { search: Some(key.into()), limit: Some(100), ..Default::default() };
    let page = state.catalog_service.list_sections(&query).await.unwrap();
    page.data.into_iter().find(|s| s.name_key == key).unwrap()
}

async fn action_by_key(state: &AppState, key: &str) -> PermissionAction {
    let query = ListQuery { search: Some(key.into()), limit: Some(100), ..Default::default() };
    let page = state.catalog_service.list_actions(&query).await.unwrap();
    page.data.into_iter().find(|a| a.name_key == key).unwrap()
}

#[tokio::test]
#[serial]
async fn seed_runs_twice_without_changes() {
    let Some(state) = setup().await else { return };

    let report = state.seed_service.run(None).await.unwrap();
    assert_eq!(report.allowed_actions_inserted, 0);
    assert_eq!(report.permissions_inserted, 0);
    assert!(!report.system_user_created);
}

#[tokio::test]
#[serial]
async fn normalized_names_collide_within_scope() {
    let Some(state) = setup().await else { return };
    let tag = suffix();

    let acme = tenant(&state, &format!("Acme {tag}"), 2).await;
    let err = state
        .tenant_service
        .create_tenant(
            &admin(),
            CreateTenantPayload {
                name: format!("  ACMÉ   {} ", tag.to_uppercase()),
                max_subsidiaries: 1,
                max_users: 1,
                max_roles: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    // Seção: única globalmente, comparada sem acento nem caixa
    let word = letters();
    state
        .catalog_service
        .create_section(CreateSectionPayload { name: format!("Zona {word}"), order: 90, visibility: false })
        .await
        .unwrap();
    let err = state
        .catalog_service
        .create_section(CreateSectionPayload {
            name: format!("ZÓNA {}", word.to_uppercase()),
            order: 91,
            visibility: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Cargo: único por (empresa, filial); o mesmo nome em outra filial é permitido
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let branch = subsidiary(&state, acme.id, "Branch").await;
    role(&state, &hq, "Caixa", RoleTemplate::Custom).await;
    role(&state, &branch, "caixa", RoleTemplate::Custom).await;
    let err = state
        .rbac_service
        .create_role(
            &admin(),
            CreateRolePayload {
                name: " CAIXA ".into(),
                tenant_id: acme.id,
                subsidiary_id: hq.id,
                template: RoleTemplate::Custom,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[serial]
async fn username_is_unique_per_subsidiary_only() {
    let Some(state) = setup().await else { return };
    let tag = suffix();
    let username = format!("luis.{tag}");

    let acme = tenant(&state, &format!("Acme {tag}"), 2).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let branch = subsidiary(&state, acme.id, "Branch").await;
    let hq_role = role(&state, &hq, "Vendedor", RoleTemplate::Vendedor).await;
    let branch_role = role(&state, &branch, "Vendedor", RoleTemplate::Vendedor).await;

    let in_hq = state.user_service.create_user(&admin(), user_payload(&username, &hq_role)).await.unwrap();
    state
        .user_service
        .create_user(&admin(), user_payload(&username.to_uppercase(), &branch_role))
        .await
        .unwrap();

    let err = state
        .user_service
        .create_user(&admin(), user_payload(&username, &hq_role))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Mesmo usuário em duas filiais: login ambíguo sem a filial
    let err = state
        .auth_service
        .login_user(LoginUserPayload { username: username.clone(), password: "segredo123".into(), subsidiary_id: None })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let token = state
        .auth_service
        .login_user(LoginUserPayload { username, password: "segredo123".into(), subsidiary_id: Some(hq.id) })
        .await
        .unwrap();
    let caller = state.auth_service.validate_token(&token).unwrap();
    assert_eq!(caller.id, in_hq.id);
    assert_eq!(caller.tenant_id, Some(acme.id));
}

#[tokio::test]
#[serial]
async fn subsidiary_limit_is_enforced() {
    let Some(state) = setup().await else { return };
    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    subsidiary(&state, acme.id, "HQ").await;

    let err = state
        .tenant_service
        .create_subsidiary(
            &admin(),
            CreateSubsidiaryPayload {
                tenant_id: acme.id,
                name: "Depósito".into(),
                subsidiary_type: SubsidiaryType::Almacen,
                allow_negative_stock: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded(_)));
}

#[tokio::test]
#[serial]
async fn tenant_toggle_cascades_to_every_descendant() {
    let Some(state) = setup().await else { return };
    let tag = suffix();
    let admin = admin();

    let acme = tenant(&state, &format!("Acme {tag}"), 2).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let branch = subsidiary(&state, acme.id, "Branch").await;
    let hq_role = role(&state, &hq, "Ventas", RoleTemplate::Ventas).await;
    let branch_role = role(&state, &branch, "Almacen", RoleTemplate::Almacen).await;
    let luis = state
        .user_service
        .create_user(&admin, user_payload(&format!("luis.{tag}"), &hq_role))
        .await
        .unwrap();
    let ana = state
        .user_service
        .create_user(&admin, user_payload(&format!("ana.{tag}"), &branch_role))
        .await
        .unwrap();

    for expected in [false, true] {
        let toggled = state.tenant_service.toggle_tenant(&admin, acme.id).await.unwrap();
        assert_eq!(toggled.status, expected);

        for id in [hq.id, branch.id] {
            assert_eq!(state.tenant_service.get_subsidiary(&admin, id).await.unwrap().status, expected);
        }
        for id in [hq_role.id, branch_role.id] {
            assert_eq!(state.rbac_service.get_role(&admin, id).await.unwrap().status, expected);
        }
        for id in [luis.id, ana.id] {
            assert_eq!(state.user_service.get_user(&admin, id).await.unwrap().status, expected);
        }
    }

    // Outra empresa não enxerga nada disso
    let outsider = tenant_user(Uuid::new_v4());
    let err = state.tenant_service.get_subsidiary(&outsider, hq.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
#[serial]
async fn template_roles_are_seeded_once() {
    let Some(state) = setup().await else { return };
    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let vendedor = role(&state, &hq, "Vendedor", RoleTemplate::Vendedor).await;

    let before = state.rbac_service.list_permissions(&admin(), vendedor.id).await.unwrap();
    assert!(!before.is_empty());

    let again = state.rbac_service.seed_role_permissions(&admin(), vendedor.id).await.unwrap();
    assert_eq!(again.inserted, 0);
    let after = state.rbac_service.list_permissions(&admin(), vendedor.id).await.unwrap();
    assert_eq!(before.len(), after.len());

    let sidebar = state.rbac_service.sidebar(&admin(), vendedor.id).await.unwrap();
    assert_eq!(sidebar.len(), 1);
    assert_eq!(sidebar[0].name, "Ventas");
    let mut modules: Vec<_> = sidebar[0].modules.iter().map(|m| m.name.as_str()).collect();
    modules.sort();
    assert_eq!(modules, ["Caja", "Cotizaciones", "Devoluciones", "Ventas"]);
}

#[tokio::test]
#[serial]
async fn ad_hoc_grants_are_validated_and_not_duplicated() {
    let Some(state) = setup().await else { return };
    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let custom = role(&state, &hq, "Auditor", RoleTemplate::Custom).await;
    let ventas = section_by_key(&state, "ventas").await;
    let almacen = section_by_key(&state, "almacen").await;
    let ver = action_by_key(&state, "ver").await;

    let payload = |section_id: Uuid, module_id: Option<Uuid>| CreateRolePermissionPayload {
        role_id: custom.id,
        action_id: ver.id,
        section_id,
        module_id,
        submodule_id: None,
    };

    state.rbac_service.create_permission(&admin(), payload(ventas.id, None)).await.unwrap();
    let err = state
        .rbac_service
        .create_permission(&admin(), payload(ventas.id, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Módulo de outra seção: hierarquia inconsistente
    let detail = state.catalog_service.section_detail(almacen.id).await.unwrap();
    let productos = detail.modules[0].module.id;
    let err = state
        .rbac_service
        .create_permission(&admin(), payload(ventas.id, Some(productos)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Integrity(_)));

    // Lista branca exige exatamente um alvo
    let err = state
        .catalog_service
        .create_allowed_action(CreateAllowedActionPayload { action_id: ver.id, module_id: None, submodule_id: None })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
#[serial]
async fn section_grant_yields_single_sidebar_section_and_follows_subsidiary_status() {
    let Some(state) = setup().await else { return };
    let admin = admin();

    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let vendedor = role(&state, &hq, "vendedor", RoleTemplate::Custom).await;
    let ventas = section_by_key(&state, "ventas").await;
    let ver = action_by_key(&state, "ver").await;

    state
        .rbac_service
        .create_permission(
            &admin,
            CreateRolePermissionPayload {
                role_id: vendedor.id,
                action_id: ver.id,
                section_id: ventas.id,
                module_id: None,
                submodule_id: None,
            },
        )
        .await
        .unwrap();
    let luis = state.user_service.create_user(&admin, user_payload("luis", &vendedor)).await.unwrap();

    let sidebar = state.rbac_service.sidebar(&admin, vendedor.id).await.unwrap();
    assert_eq!(sidebar.len(), 1);
    assert_eq!(sidebar[0].id, ventas.id);
    assert!(sidebar[0].modules.is_empty());

    state.tenant_service.toggle_subsidiary(&admin, hq.id).await.unwrap();
    assert!(!state.user_service.get_user(&admin, luis.id).await.unwrap().status);

    state.tenant_service.toggle_subsidiary(&admin, hq.id).await.unwrap();
    assert!(state.user_service.get_user(&admin, luis.id).await.unwrap().status);
}

fn window(start_day: Weekday, end_day: Weekday, opening: u32, closing: u32) -> ScheduleWindow {
    ScheduleWindow {
        start_day,
        end_day,
        opening_hour: NaiveTime::from_hms_opt(opening, 0, 0).unwrap(),
        closing_hour: NaiveTime::from_hms_opt(closing, 0, 0).unwrap(),
    }
}

#[tokio::test]
#[serial]
async fn module_with_submodules_only_takes_actions_on_submodules() {
    let Some(state) = setup().await else { return };
    let almacen = section_by_key(&state, "almacen").await;
    let detail = state.catalog_service.section_detail(almacen.id).await.unwrap();
    let inventario = detail.modules.iter().find(|m| m.module.name_key == "inventario").unwrap();
    let productos = detail.modules.iter().find(|m| m.module.name_key == "productos").unwrap();
    assert!(!inventario.submodules.is_empty());
    let crear = action_by_key(&state, "crear").await;
    let ver = action_by_key(&state, "ver").await;

    let err = state
        .catalog_service
        .create_allowed_action(CreateAllowedActionPayload {
            action_id: crear.id,
            module_id: Some(inventario.module.id),
            submodule_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Integrity(_)), "{err:?}");

    // Módulo sem submódulos continua aceitando no próprio módulo (aqui já liberada)
    let err = state
        .catalog_service
        .create_allowed_action(CreateAllowedActionPayload {
            action_id: ver.id,
            module_id: Some(productos.module.id),
            submodule_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let custom = role(&state, &hq, "Auditor", RoleTemplate::Custom).await;
    let err = state
        .rbac_service
        .create_permission(
            &admin(),
            CreateRolePermissionPayload {
                role_id: custom.id,
                action_id: crear.id,
                section_id: almacen.id,
                module_id: Some(inventario.module.id),
                submodule_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Integrity(_)), "{err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn concurrent_tenant_toggles_both_apply() {
    let Some(state) = setup().await else { return };
    let admin = admin();
    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;

    for _ in 0..5 {
        let (first, second) = tokio::join!(
            state.tenant_service.toggle_tenant(&admin, acme.id),
            state.tenant_service.toggle_tenant(&admin, acme.id),
        );
        assert_ne!(first.unwrap().status, second.unwrap().status);

        assert!(state.tenant_service.get_tenant(&admin, acme.id).await.unwrap().status);
        assert!(state.tenant_service.get_subsidiary(&admin, hq.id).await.unwrap().status);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn concurrent_creates_respect_tenant_limits() {
    let Some(state) = setup().await else { return };
    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;

    let payload = |name: &str| CreateSubsidiaryPayload {
        tenant_id: acme.id,
        name: name.into(),
        subsidiary_type: SubsidiaryType::Sucursal,
        allow_negative_stock: false,
    };
    let admin = admin();
    let (first, second) = tokio::join!(
        state.tenant_service.create_subsidiary(&admin, payload("Norte")),
        state.tenant_service.create_subsidiary(&admin, payload("Sul")),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results.iter().any(|r| matches!(r, Err(AppError::CapacityExceeded(_)))),
        "{results:?}"
    );
    let query = ListQuery { tenant_id: Some(acme.id), ..Default::default() };
    assert_eq!(state.tenant_service.list_subsidiaries(&admin, &query).await.unwrap().total, 1);
}

#[tokio::test]
#[serial]
async fn role_toggle_cascades_to_its_users_only() {
    let Some(state) = setup().await else { return };
    let tag = suffix();
    let admin = admin();

    let acme = tenant(&state, &format!("Acme {tag}"), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let caixa = role(&state, &hq, "Caixa", RoleTemplate::Custom).await;
    let gerente = role(&state, &hq, "Gerente", RoleTemplate::Admin).await;
    let luis = state
        .user_service
        .create_user(&admin, user_payload(&format!("luis.{tag}"), &caixa))
        .await
        .unwrap();
    let ana = state
        .user_service
        .create_user(&admin, user_payload(&format!("ana.{tag}"), &gerente))
        .await
        .unwrap();

    for expected in [false, true] {
        let toggled = state.rbac_service.toggle_role(&admin, caixa.id).await.unwrap();
        assert_eq!(toggled.status, expected);
        assert_eq!(state.user_service.get_user(&admin, luis.id).await.unwrap().status, expected);
        assert!(state.user_service.get_user(&admin, ana.id).await.unwrap().status);
    }
}

#[tokio::test]
#[serial]
async fn duplicate_schedule_windows_conflict() {
    let Some(state) = setup().await else { return };
    let tag = suffix();
    let admin = admin();

    let acme = tenant(&state, &format!("Acme {tag}"), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let caixa = role(&state, &hq, "Caixa", RoleTemplate::Custom).await;
    let luis = state
        .user_service
        .create_user(&admin, user_payload(&format!("luis.{tag}"), &caixa))
        .await
        .unwrap();

    for (owner, owner_id) in [(ScheduleOwner::Subsidiary, hq.id), (ScheduleOwner::User, luis.id)] {
        let weekdays = window(Weekday::Lunes, Weekday::Viernes, 8, 18);
        let saturday = window(Weekday::Sabado, Weekday::Sabado, 9, 13);

        let first = state.schedule_service.create(&admin, owner, owner_id, weekdays).await.unwrap();
        let err = state.schedule_service.create(&admin, owner, owner_id, weekdays).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

        let second = state.schedule_service.create(&admin, owner, owner_id, saturday).await.unwrap();
        let err = state
            .schedule_service
            .update(&admin, owner, second.id, weekdays)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

        // Regravar a própria janela não é duplicata
        let same = state.schedule_service.update(&admin, owner, first.id, weekdays).await.unwrap();
        assert_eq!(same.id, first.id);
        assert_eq!(state.schedule_service.list(&admin, owner, owner_id).await.unwrap().len(), 2);
    }
}

#[tokio::test]
#[serial]
async fn configuration_tree_places_actions_by_catalog_shape() {
    let Some(state) = setup().await else { return };
    let acme = tenant(&state, &format!("Acme {}", suffix()), 1).await;
    let hq = subsidiary(&state, acme.id, "HQ").await;
    let custom = role(&state, &hq, "Auditor", RoleTemplate::Custom).await;

    let tree = state.rbac_service.configuration_tree(&admin(), custom.id).await.unwrap();
    assert!(tree.iter().all(|s| s.name != "Configuración"));
    assert!(tree.windows(2).all(|w| w[0].order <= w[1].order));

    let almacen = tree.iter().find(|s| s.name == "Almacén").unwrap();
    let inventario = almacen.modules.iter().find(|m| m.name == "Inventario").unwrap();
    assert!(inventario.actions.is_empty());
    assert_eq!(inventario.submodules.len(), 3);
    for submodule in &inventario.submodules {
        let mut names: Vec<_> = submodule.actions.iter().map(|a| a.name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["exportar", "ver"]);
    }

    let productos = almacen.modules.iter().find(|m| m.name == "Productos").unwrap();
    assert!(productos.submodules.is_empty());
    let mut names: Vec<_> = productos.actions.iter().map(|a| a.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["crear", "editar", "estado", "ver"]);

    // O cargo de sistema só enxerga as seções ocultas
    let system = state.rbac_service.configuration_tree(&admin(), SYSTEM_ADMIN_ROLE_ID).await.unwrap();
    assert!(system.iter().any(|s| s.name == "Configuración"));
    assert!(system.iter().all(|s| s.name != "Ventas" && s.name != "Almacén"));
}
