use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shakti_server::config::{Settings, SuperAdminSeed};
use shakti_server::store::{MemoryStore, Query, Store, Table};
use tower::ServiceExt;

struct Client {
    router: Router,
    store: Arc<dyn Store>,
}

impl Client {
    async fn new() -> Self {
        let settings = Settings {
            bcrypt_cost: 4,
            super_admin: Some(SuperAdminSeed {
                username: "root".into(),
                password: "rootpass".into(),
                name: "Platform Owner".into(),
            }),
            ..Settings::default()
        };
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        assert!(shakti_server::bootstrap::ensure_super_admin(store.as_ref(), &settings)
            .await
            .unwrap());
        let router = shakti_server::build(settings, Arc::clone(&store)).unwrap().into_router();
        Self { router, store }
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        tenant: Option<&str>,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = tenant {
            req = req.header("x-tenant-subdomain", t);
        }
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    async fn login(&self, tenant: Option<&str>, body: Value) -> String {
        let (status, res) = self.call("POST", "/authentication", tenant, None, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {res}");
        res["accessToken"].as_str().unwrap().to_string()
    }

    async fn employee_login(&self, emp_id: &str, password: &str) -> String {
        self.login(
            Some("acme"),
            json!({"strategy": "local", "employee_id": emp_id, "password": password}),
        )
        .await
    }
}

fn len(v: &Value) -> usize {
    v.as_array().map_or(0, Vec::len)
}

fn id_of(v: &Value) -> String {
    v["id"].as_str().unwrap().to_string()
}

/// Platform setup: a tenant with one company admin, logged in.
async fn acme(client: &Client) -> (String, String) {
    let root = client
        .login(None, json!({"strategy": "super-admin", "username": "root", "password": "rootpass"}))
        .await;
    let (status, tenant) = client
        .call("POST", "/tenants", None, Some(&root), Some(json!({"name": "Acme Finance", "subdomain": "acme"})))
        .await;
    assert_eq!(status, StatusCode::OK, "{tenant}");
    let (status, _) = client
        .call(
            "POST",
            "/company-admins",
            None,
            Some(&root),
            Some(json!({"tenant_id": id_of(&tenant), "employee_id": "ADM1", "name": "Asha", "password": "admin123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    (root, client.employee_login("ADM1", "admin123").await)
}

async fn acme_id(client: &Client, root: &str) -> String {
    let (_, tenants) = client.call("GET", "/tenants", None, Some(root), None).await;
    id_of(&tenants[0])
}

async fn create_product(client: &Client, admin: &str, name: &str) {
    let (status, product) = client
        .call("POST", "/products", Some("acme"), Some(admin), Some(json!({"name": name})))
        .await;
    assert_eq!(status, StatusCode::OK, "{product}");
}

async fn create_team(client: &Client, admin: &str, incharge_id: &str, product: &str, telecallers: &[&str]) -> Value {
    let (status, team) = client
        .call(
            "POST",
            "/teams",
            Some("acme"),
            Some(admin),
            Some(json!({"name": "Alpha", "team_incharge_id": incharge_id, "product_name": product, "telecaller_ids": telecallers})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{team}");
    team
}

async fn create_employee(client: &Client, admin: &str, emp_id: &str, role: &str) -> String {
    let (status, employee) = client
        .call(
            "POST",
            "/employees",
            Some("acme"),
            Some(admin),
            Some(json!({"name": format!("{emp_id} name"), "mobile": "9876543210", "emp_id": emp_id, "password": "secret1", "role": role})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{employee}");
    id_of(&employee)
}

#[tokio::test]
async fn platform_onboards_a_tenant() {
    let client = Client::new().await;
    let root = client
        .login(None, json!({"strategy": "super-admin", "username": "root", "password": "rootpass"}))
        .await;

    let (_, check) = client
        .call("POST", "/tenants/check-subdomain", None, Some(&root), Some(json!({"subdomain": "Acme"})))
        .await;
    assert_eq!(check, json!({"available": true, "valid": true}));

    let (status, tenant) = client
        .call("POST", "/tenants", None, Some(&root), Some(json!({"name": "Acme Finance", "subdomain": "Acme"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["subdomain"], "acme");
    assert_eq!(tenant["status"], "active");
    assert_eq!(tenant["plan"], "basic");
    assert_eq!(tenant["max_users"], 10);

    let (status, dup) = client
        .call("POST", "/tenants", None, Some(&root), Some(json!({"name": "Other", "subdomain": "acme"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(dup["message"], "A tenant with this subdomain already exists");

    let (_, taken) = client
        .call("POST", "/tenants/check-subdomain", None, Some(&root), Some(json!({"subdomain": "acme"})))
        .await;
    assert_eq!(taken["available"], false);
    assert_eq!(taken["valid"], true);
    assert_eq!(taken["suggestions"][0], "acme1");

    let (_, reserved) = client
        .call("POST", "/tenants/check-subdomain", None, Some(&root), Some(json!({"subdomain": "admin"})))
        .await;
    assert_eq!(reserved["valid"], false);

    let (status, admin) = client
        .call(
            "POST",
            "/company-admins",
            None,
            Some(&root),
            Some(json!({"tenant_id": id_of(&tenant), "employee_id": "ADM1", "name": "Asha", "password": "admin123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(admin.get("password_hash").is_none());

    let (status, session) = client
        .call(
            "POST",
            "/authentication",
            Some("acme"),
            None,
            Some(json!({"strategy": "local", "employee_id": "ADM1", "password": "admin123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["role"], "CompanyAdmin");
    assert_eq!(session["dashboard"], "/companyadmin");

    let (status, wrong) = client
        .call(
            "POST",
            "/authentication",
            Some("acme"),
            None,
            Some(json!({"strategy": "local", "employee_id": "ADM1", "password": "nope"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong["message"], "Invalid employee ID or password");

    let (status, _) = client
        .call(
            "POST",
            "/authentication",
            Some("nowhere"),
            None,
            Some(json!({"strategy": "local", "employee_id": "ADM1", "password": "admin123"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_gates_and_tenant_scope() {
    let client = Client::new().await;
    let (_root, admin) = acme(&client).await;
    create_employee(&client, &admin, "TC1", "Telecaller").await;
    let telecaller = client.employee_login("TC1", "secret1").await;

    let (status, _) = client.call("GET", "/cases", Some("acme"), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client.call("GET", "/tenants", None, Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = client.call("GET", "/employees", Some("acme"), Some(&telecaller), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = client
        .call("POST", "/cases/upload", Some("acme"), Some(&telecaller), Some(json!({"team_id": "x", "product_name": "y"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, dup) = client
        .call(
            "POST",
            "/employees",
            Some("acme"),
            Some(&admin),
            Some(json!({"name": "Clash", "emp_id": "ADM1", "password": "secret1", "role": "Telecaller"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{dup}");

    let (status, bad_role) = client
        .call(
            "POST",
            "/employees",
            Some("acme"),
            Some(&admin),
            Some(json!({"name": "Boss", "emp_id": "B1", "password": "secret1", "role": "CompanyAdmin"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(bad_role["errors"]["role"].is_array());

    let (status, listed) = client.call("GET", "/employees", Some("acme"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed[0].get("password_hash").is_none());
}

#[tokio::test]
async fn cases_flow_from_upload_to_call_logs() {
    let client = Client::new().await;
    let (_root, admin) = acme(&client).await;

    let incharge_id = create_employee(&client, &admin, "INC1", "TeamIncharge").await;
    let tc1 = create_employee(&client, &admin, "TC1", "Telecaller").await;
    let tc2 = create_employee(&client, &admin, "TC2", "Telecaller").await;

    let (status, product) = client
        .call("POST", "/products", Some("acme"), Some(&admin), Some(json!({"name": " Personal Loan "})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product, json!({"name": "Personal Loan", "columns": 17}));
    let (status, _) = client
        .call("POST", "/products", Some("acme"), Some(&admin), Some(json!({"name": "Personal Loan"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, team) = client
        .call(
            "POST",
            "/teams",
            Some("acme"),
            Some(&admin),
            Some(json!({
                "name": "Alpha",
                "team_incharge_id": incharge_id,
                "product_name": "Personal Loan",
                "telecaller_ids": [tc1, tc2],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{team}");
    assert_eq!(team["incharge"]["emp_id"], "INC1");
    assert_eq!(team["telecallers"].as_array().unwrap().len(), 2);
    let team_id = id_of(&team);

    let incharge = client.employee_login("INC1", "secret1").await;
    let (_, template) = client
        .call("POST", "/columns/template", Some("acme"), Some(&incharge), Some(json!({"product": "Personal Loan"})))
        .await;
    assert_eq!(template["headers"][0], "EMPID");
    assert_eq!(template["headers"].as_array().unwrap().len(), 17);
    assert_eq!(template["sample"][0][0], "EMP001");

    let (status, rejected) = client
        .call(
            "POST",
            "/cases/upload",
            Some("acme"),
            Some(&incharge),
            Some(json!({
                "team_id": team_id,
                "product_name": "Personal Loan",
                "rows": [{"EMPID": "TC1", "Customer Name": "", "Loan ID": "LN9"}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(rejected["errors"]["rows[0]"], json!(["Customer Name is required"]));

    let (status, uploaded) = client
        .call(
            "POST",
            "/cases/upload",
            Some("acme"),
            Some(&incharge),
            Some(json!({
                "team_id": team_id,
                "product_name": "Personal Loan",
                "rows": [
                    {"EMPID": "TC1", "Customer Name": "Rajesh Kumar", "Loan ID": "LN1", "Mobile No": "9876543210", "DPD": "45", "Outstanding Amount": "450000"},
                    {"EMPID": "NOBODY", "Customer Name": "Sunita Sharma", "Loan ID": "LN2", "DPD": "30"},
                    {"EMPID": "tc1", "Customer Name": "Vikram Rao", "Loan ID": "LN3", "DPD": "10"},
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{uploaded}");
    assert_eq!(
        uploaded,
        json!({"totalUploaded": 3, "autoAssigned": 2, "unassigned": 1, "errors": []})
    );

    let (_, pool) = client
        .call("GET", "/cases?unassigned=true", Some("acme"), Some(&incharge), None)
        .await;
    let pool = pool.as_array().unwrap().clone();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0]["status"], "new");
    let unassigned_id = id_of(&pool[0]);

    let (_, assigned) = client
        .call(
            "POST",
            "/cases/assign",
            Some("acme"),
            Some(&incharge),
            Some(json!({"case_ids": [unassigned_id, "00000000-missing"], "telecaller_id": tc2})),
        )
        .await;
    assert_eq!(assigned["total"], 2);
    assert_eq!(assigned["success"], 1);
    assert_eq!(assigned["errors"], 1);
    assert_eq!(assigned["errorDetails"][0]["caseId"], "00000000");
    assert_eq!(assigned["action"], "assign");

    let (_, found) = client
        .call("GET", "/cases?search=rajesh", Some("acme"), Some(&incharge), None)
        .await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let telecaller = client.employee_login("TC1", "secret1").await;
    let (_, mine) = client.call("GET", "/cases", Some("acme"), Some(&telecaller), None).await;
    let mine = mine.as_array().unwrap().clone();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|c| c["telecaller_id"] == json!(tc1)));

    let (status, _) = client
        .call("GET", &format!("/cases/{unassigned_id}"), Some("acme"), Some(&telecaller), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let rajesh = mine.iter().find(|c| c["case_data"]["loanId"] == "LN1").unwrap();
    let rajesh_id = id_of(rajesh);
    let (status, log) = client
        .call(
            "POST",
            "/call-logs",
            Some("acme"),
            Some(&telecaller),
            Some(json!({"case_id": rajesh_id, "call_status": "connected", "amount_collected": "5,000"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{log}");
    assert_eq!(log["employee_id"], json!(tc1));

    let (_, case) = client
        .call("GET", &format!("/cases/{rajesh_id}"), Some("acme"), Some(&telecaller), None)
        .await;
    assert_eq!(case["status"], "in_progress");

    let (_, logs) = client
        .call("GET", &format!("/call-logs?case_id={rajesh_id}"), Some("acme"), Some(&telecaller), None)
        .await;
    assert_eq!(logs.as_array().unwrap().len(), 1);

    let (status, _) = client
        .call(
            "PATCH",
            &format!("/cases/{rajesh_id}"),
            Some("acme"),
            Some(&telecaller),
            Some(json!({"case_data": {"loanAmount": "1"}})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, patched) = client
        .call(
            "PATCH",
            &format!("/cases/{rajesh_id}"),
            Some("acme"),
            Some(&telecaller),
            Some(json!({"remarks": "Promised next week", "priority": "high"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["case_data"]["remarks"], "Promised next week");

    let (_, dashboard) = client
        .call("POST", "/reports/telecaller-dashboard", Some("acme"), Some(&telecaller), None)
        .await;
    assert_eq!(dashboard["assignedCases"], 2);
    assert_eq!(dashboard["callsToday"], 1);
    assert_eq!(dashboard["recoveryToday"], 5000.0);

    let (_, preview) = client
        .call(
            "POST",
            "/cases/reassign",
            Some("acme"),
            Some(&incharge),
            Some(json!({"from_telecaller": tc1, "to_telecaller": tc2, "dpd_range": "31-60", "preview": true})),
        )
        .await;
    assert_eq!(preview, json!({"preview": true, "matched": 1}));

    let (_, moved) = client
        .call(
            "POST",
            "/cases/reassign",
            Some("acme"),
            Some(&incharge),
            Some(json!({"from_telecaller": tc1, "to_telecaller": tc2, "max_amount": 500000})),
        )
        .await;
    assert_eq!(moved["moved"], 1);

    let (_, stats) = client.call("POST", "/cases/stats", Some("acme"), Some(&incharge), None).await;
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["new"], 0);

    let (_, team_report) = client
        .call("POST", "/reports/team-dashboard", Some("acme"), Some(&incharge), None)
        .await;
    assert_eq!(team_report["totalTeams"], 1);
    assert_eq!(team_report["totalTelecallers"], 2);
    assert_eq!(team_report["totalCases"], 3);
    assert_eq!(team_report["pendingCases"], 0);

    let (_, exported) = client
        .call("POST", "/cases/export", Some("acme"), Some(&incharge), Some(json!({"product": "Personal Loan"})))
        .await;
    assert_eq!(exported["headers"][0], "Customer Name");
    assert_eq!(exported["rows"].as_array().unwrap().len(), 3);

    let (_, unassigned) = client
        .call("POST", "/cases/unassign", Some("acme"), Some(&incharge), Some(json!({"case_ids": [unassigned_id]})))
        .await;
    assert_eq!(unassigned["success"], 1);

    let (_, overview) = client
        .call("POST", "/reports/company-overview", Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(overview["employees"]["telecallers"], 2);
    assert_eq!(overview["products"], 1);
    assert_eq!(overview["cases"]["new"], 1);
}

#[tokio::test]
async fn employee_lifecycle_keeps_teams_and_cases_consistent() {
    let client = Client::new().await;
    let (_root, admin) = acme(&client).await;
    let incharge_id = create_employee(&client, &admin, "INC1", "TeamIncharge").await;
    let tc1 = create_employee(&client, &admin, "TC1", "Telecaller").await;
    let tc2 = create_employee(&client, &admin, "TC2", "Telecaller").await;

    let (status, clash) = client
        .call(
            "POST",
            "/employees",
            Some("acme"),
            Some(&admin),
            Some(json!({"name": "Shadow", "emp_id": "tc1", "password": "secret1", "role": "Telecaller"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{clash}");

    let (status, reset) = client
        .call("POST", "/employees/reset-password", Some("acme"), Some(&admin), Some(json!({"id": tc2})))
        .await;
    assert_eq!(status, StatusCode::OK, "{reset}");
    let temporary = reset["temporaryPassword"].as_str().unwrap().to_string();
    assert_eq!(temporary.len(), 10);
    client.employee_login("TC2", &temporary).await;

    let (status, renamed) = client
        .call("PATCH", &format!("/employees/{tc2}"), Some("acme"), Some(&admin), Some(json!({"name": "  Meera  "})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Meera");

    create_product(&client, &admin, "Gold").await;
    let team = create_team(&client, &admin, &incharge_id, "Gold", &[tc1.as_str()]).await;
    let (status, uploaded) = client
        .call(
            "POST",
            "/cases/upload",
            Some("acme"),
            Some(&admin),
            Some(json!({
                "team_id": id_of(&team),
                "product_name": "Gold",
                "rows": [{"EMPID": "TC1", "Customer Name": "Rajesh Kumar", "Loan ID": "LN1"}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{uploaded}");
    assert_eq!(uploaded["autoAssigned"], 1);

    let (status, demoted) = client
        .call(
            "PATCH",
            &format!("/employees/{incharge_id}"),
            Some("acme"),
            Some(&admin),
            Some(json!({"role": "Telecaller"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{demoted}");
    let (status, _) = client
        .call("DELETE", &format!("/employees/{incharge_id}"), Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, inactive) = client
        .call("PATCH", &format!("/employees/{tc1}"), Some("acme"), Some(&admin), Some(json!({"status": "inactive"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inactive["status"], "inactive");
    let (_, cases) = client.call("GET", "/cases", Some("acme"), Some(&admin), None).await;
    assert_eq!(cases[0]["status"], "new");
    assert!(cases[0]["telecaller_id"].is_null());

    let (status, removed) = client
        .call("DELETE", &format!("/employees/{tc2}"), Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["emp_id"], "TC2");

    let (status, bulk) = client
        .call("POST", "/employees/bulk-delete", Some("acme"), Some(&admin), Some(json!({"ids": [tc1, "missing"]})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bulk["successful"], 1);
    assert_eq!(bulk["failed"], 1);
    assert_eq!(bulk["errors"][0]["id"], "missing");

    let (_, left) = client.call("GET", "/employees", Some("acme"), Some(&admin), None).await;
    assert_eq!(len(&left), 1);
}

#[tokio::test]
async fn team_management() {
    let client = Client::new().await;
    let (_root, admin) = acme(&client).await;
    let incharge_id = create_employee(&client, &admin, "INC1", "TeamIncharge").await;
    let tc1 = create_employee(&client, &admin, "TC1", "Telecaller").await;
    let tc2 = create_employee(&client, &admin, "TC2", "Telecaller").await;
    create_product(&client, &admin, "Gold").await;

    let (status, missing) = client
        .call(
            "POST",
            "/teams",
            Some("acme"),
            Some(&admin),
            Some(json!({"name": "Ghost", "team_incharge_id": incharge_id, "product_name": "Gold", "telecaller_ids": ["no-such-id"]})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{missing}");
    let (status, blank) = client
        .call(
            "POST",
            "/teams",
            Some("acme"),
            Some(&admin),
            Some(json!({"name": "   ", "team_incharge_id": incharge_id, "product_name": "Gold"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{blank}");
    let (_, teams) = client.call("GET", "/teams", Some("acme"), Some(&admin), None).await;
    assert_eq!(len(&teams), 0);

    let team = create_team(&client, &admin, &incharge_id, "Gold", &[tc1.as_str()]).await;
    let team_id = id_of(&team);

    let (_, free) = client
        .call("POST", "/teams/available-telecallers", Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(len(&free), 1);
    assert_eq!(free[0]["id"], json!(tc2));
    let (_, editable) = client
        .call(
            "POST",
            "/teams/available-telecallers",
            Some("acme"),
            Some(&admin),
            Some(json!({"exclude_team_id": team_id})),
        )
        .await;
    assert_eq!(len(&editable), 2);

    let (_, incharges) = client.call("POST", "/teams/incharges", Some("acme"), Some(&admin), None).await;
    assert_eq!(len(&incharges), 1);
    assert_eq!(incharges[0]["emp_id"], "INC1");

    let (status, patched) = client
        .call(
            "PATCH",
            &format!("/teams/{team_id}"),
            Some("acme"),
            Some(&admin),
            Some(json!({"name": "Bravo", "telecaller_ids": [tc2]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{patched}");
    assert_eq!(patched["name"], "Bravo");
    assert_eq!(len(&patched["telecallers"]), 1);
    assert_eq!(patched["telecallers"][0]["id"], json!(tc2));

    let (_, toggled) = client
        .call("POST", "/teams/toggle-status", Some("acme"), Some(&admin), Some(json!({"id": team_id})))
        .await;
    assert_eq!(toggled["status"], "inactive");

    let (status, _) = client
        .call("DELETE", &format!("/teams/{team_id}"), Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, member) = client
        .call("GET", &format!("/employees/{tc2}"), Some("acme"), Some(&admin), None)
        .await;
    assert!(member["team_id"].is_null());
}

#[tokio::test]
async fn products_and_column_configurations() {
    let client = Client::new().await;
    let (_root, admin) = acme(&client).await;
    let incharge_id = create_employee(&client, &admin, "INC1", "TeamIncharge").await;
    create_product(&client, &admin, "Gold").await;

    let (status, dup) = client
        .call(
            "POST",
            "/columns/save",
            Some("acme"),
            Some(&admin),
            Some(json!({"product": "Gold", "columns": [
                {"column_name": "loanId", "display_name": "Loan ID"},
                {"column_name": "loanId", "display_name": "Loan No"},
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(dup["errors"]["columns[1].column_name"].is_array());

    let (status, saved) = client
        .call(
            "POST",
            "/columns/save",
            Some("acme"),
            Some(&admin),
            Some(json!({"product": "Gold", "columns": [
                {"column_name": "customerName", "display_name": "Customer Name"},
                {"column_name": "loanId", "display_name": "Loan ID", "is_active": false},
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{saved}");
    assert_eq!(saved["columns"][1]["column_order"], 2);
    let (_, active) = client
        .call("GET", "/columns?product=Gold&active=true", Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(len(&active), 1);

    let team = create_team(&client, &admin, &incharge_id, "Gold", &[]).await;
    let (status, renamed) = client
        .call("PATCH", "/products/Gold", Some("acme"), Some(&admin), Some(json!({"name": "Platinum"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed, json!({"name": "Platinum", "previous": "Gold"}));
    let (_, team) = client
        .call("GET", &format!("/teams/{}", id_of(&team)), Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(team["product_name"], "Platinum");
    let (_, products) = client.call("GET", "/products", Some("acme"), Some(&admin), None).await;
    assert_eq!(products, json!(["Platinum"]));

    let (status, removed) = client
        .call("DELETE", "/products/Platinum", Some("acme"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["removedColumns"], 2);

    create_product(&client, &admin, "Silver").await;
    let (_, cleared) = client.call("POST", "/columns/clear", Some("acme"), Some(&admin), None).await;
    assert_eq!(cleared, json!({"removed": 17}));
    let (_, products) = client.call("GET", "/products", Some("acme"), Some(&admin), None).await;
    assert_eq!(len(&products), 0);
}

#[tokio::test]
async fn tenant_administration() {
    let client = Client::new().await;
    let (root, admin) = acme(&client).await;
    let tenant_id = acme_id(&client, &root).await;
    create_employee(&client, &admin, "TC1", "Telecaller").await;

    let (status, me) = client.call("GET", "/authentication/me", Some("acme"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["role"], "CompanyAdmin");
    assert_eq!(me["dashboard"], "/companyadmin");

    let (status, nulls) = client
        .call(
            "PATCH",
            &format!("/tenants/{tenant_id}"),
            None,
            Some(&root),
            Some(json!({"name": null, "subdomain": null})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(nulls["errors"]["name"].is_array());
    assert!(nulls["errors"]["subdomain"].is_array());
    client.employee_login("ADM1", "admin123").await;

    let (status, patched) = client
        .call(
            "PATCH",
            &format!("/tenants/{tenant_id}"),
            None,
            Some(&root),
            Some(json!({"plan": "premium", "phone_number": " 555-0100 ", "address": null})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{patched}");
    assert_eq!(patched["plan"], "premium");
    assert_eq!(patched["phone_number"], "555-0100");
    assert_eq!(patched["name"], "Acme Finance");
    assert_eq!(patched["subdomain"], "acme");

    let (status, second) = client
        .call(
            "POST",
            "/company-admins",
            None,
            Some(&root),
            Some(json!({"tenant_id": tenant_id, "employee_id": "ADM2", "name": "Ravi", "password": "admin456"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client
        .call(
            "DELETE",
            &format!("/company-admins/{}?tenant_id={tenant_id}", id_of(&second)),
            None,
            Some(&root),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client
        .call(
            "POST",
            "/authentication",
            Some("acme"),
            None,
            Some(json!({"strategy": "local", "employee_id": "ADM2", "password": "admin456"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client
        .call("DELETE", &format!("/tenants/{tenant_id}"), None, Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let leftovers = client
        .store
        .select(&Query::tenant(Table::Employees, &tenant_id))
        .await
        .unwrap();
    assert!(leftovers.is_empty());
    let (status, _) = client
        .call(
            "POST",
            "/authentication",
            Some("acme"),
            None,
            Some(json!({"strategy": "local", "employee_id": "ADM1", "password": "admin123"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn dashboard_of(client: &Client, token: &str, telecaller_id: &str) -> Value {
    let (status, dashboard) = client
        .call(
            "POST",
            "/reports/telecaller-dashboard",
            Some("acme"),
            Some(token),
            Some(json!({"telecaller_id": telecaller_id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{dashboard}");
    dashboard
}

#[tokio::test]
async fn telecaller_dashboard_scope_and_followups() {
    let client = Client::new().await;
    let (root, admin) = acme(&client).await;
    let tenant_id = acme_id(&client, &root).await;
    create_employee(&client, &admin, "INC1", "TeamIncharge").await;
    let tc1 = create_employee(&client, &admin, "TC1", "Telecaller").await;
    let incharge = client.employee_login("INC1", "secret1").await;

    let (status, _) = client
        .call(
            "POST",
            "/reports/telecaller-dashboard",
            Some("acme"),
            Some(&incharge),
            Some(json!({"telecaller_id": tc1})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let empty = dashboard_of(&client, &admin, &tc1).await;
    assert_eq!(empty["pendingFollowups"], 0);
    assert!(empty["recoveryToday"].as_f64().unwrap().is_sign_positive());

    let today = chrono::Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap();
    let store = &client.store;
    let case = store
        .insert_one(
            Table::CustomerCases,
            json!({"tenant_id": tenant_id, "telecaller_id": tc1, "status": "in_progress", "case_data": {}}),
        )
        .await
        .unwrap();
    let case_id = id_of(&case);
    let log = |at: &str, ptp: Option<String>| {
        json!({
            "tenant_id": tenant_id,
            "case_id": case_id,
            "employee_id": tc1,
            "call_status": "connected",
            "ptp_date": ptp,
            "created_at": at,
        })
    };
    store
        .insert(
            Table::CaseCallLogs,
            vec![
                log("2020-01-01T09:00:00.000Z", Some(yesterday.to_string())),
                log("2020-01-02T09:00:00.000Z", None),
            ],
        )
        .await
        .unwrap();

    assert_eq!(dashboard_of(&client, &admin, &tc1).await["pendingFollowups"], 0);

    store
        .insert_one(
            Table::CaseCallLogs,
            log("2020-01-03T09:00:00.000Z", Some(today.to_string())),
        )
        .await
        .unwrap();
    let d = dashboard_of(&client, &admin, &tc1).await;
    assert_eq!(d["pendingFollowups"], 1);
    assert_eq!(d["assignedCases"], 1);
}
