//! 管理端 CLI 操作

use crate::client::handle_error;
use clap::ValueEnum;
use foodnest_core::{AuthResponse, ComboView, FoodItem, UserSummary};
use reqwest::Client;
use serde_json::{json, Value};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 用户登录，打印 token
pub async fn login(
    client: &Client,
    base: &str,
    email: &str,
    password: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/auth/login", base);
    let resp = handle_error(
        client
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?,
    )
    .await?;
    let auth: AuthResponse = resp.json().await?;

    match output {
        OutputFormat::Json => print_json(&auth)?,
        OutputFormat::Table => {
            println!("logged in as {} ({})", auth.user.email, auth.user.role);
            println!();
            println!("token: {}", auth.token);
            println!();
            println!("export FN_TOKEN=<token> to use it with this CLI");
        }
    }
    Ok(())
}

/// 列出所有用户（superadmin）
pub async fn list_users(client: &Client, base: &str, output: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/admin/users", base);
    let resp = handle_error(client.get(&url).send().await?).await?;
    let body: Value = resp.json().await?;
    let items: Vec<UserSummary> = serde_json::from_value(body["items"].clone())?;

    match output {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Table => {
            println!("{:<38} {:<12} {:<10} NAME", "ID", "ROLE", "STATUS");
            for user in items {
                println!(
                    "{:<38} {:<12} {:<10} {} <{}>",
                    user.id, user.role, user.status, user.name, user.email
                );
            }
        }
    }
    Ok(())
}

/// 创建用户（superadmin）
pub async fn create_user(
    client: &Client,
    base: &str,
    name: &str,
    email: &str,
    role: &str,
    password: &str,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let url = format!("{}/admin/users", base);
    let resp = handle_error(
        client
            .post(&url)
            .json(&json!({
                "name": name,
                "email": email,
                "role": role,
                "password": password
            }))
            .send()
            .await?,
    )
    .await?;
    let body: Value = resp.json().await?;

    match output {
        OutputFormat::Json => print_json(&body)?,
        OutputFormat::Table => println!(
            "created user {} <{}>",
            body["user"]["name"].as_str().unwrap_or(name),
            body["user"]["email"].as_str().unwrap_or(email)
        ),
    }
    Ok(())
}

/// 删除用户（superadmin）
pub async fn delete_user(client: &Client, base: &str, id: &str) -> anyhow::Result<()> {
    let url = format!("{}/admin/users/{}", base, id);
    handle_error(client.delete(&url).send().await?).await?;
    println!("deleted user {}", id);
    Ok(())
}

/// 列出注册申请（superadmin）
pub async fn list_requests(client: &Client, base: &str, output: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/admin/requests", base);
    let resp = handle_error(client.get(&url).send().await?).await?;
    let body: Value = resp.json().await?;
    let items = body["items"].as_array().cloned().unwrap_or_default();

    match output {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Table => {
            println!("{:<38} {:<12} NAME", "ID", "ROLE");
            for item in items {
                println!(
                    "{:<38} {:<12} {} <{}>",
                    item["id"].as_str().unwrap_or("-"),
                    item["role"].as_str().unwrap_or("-"),
                    item["name"].as_str().unwrap_or("-"),
                    item["email"].as_str().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

/// 审批通过注册申请（superadmin）
pub async fn approve_request(client: &Client, base: &str, id: &str) -> anyhow::Result<()> {
    let url = format!("{}/admin/requests/{}/approve", base, id);
    let resp = handle_error(client.post(&url).send().await?).await?;
    let body: Value = resp.json().await?;
    println!(
        "approved request {}; user {} created",
        id,
        body["user"]["id"].as_str().unwrap_or("-")
    );
    Ok(())
}

/// 拒绝注册申请（superadmin）
pub async fn decline_request(client: &Client, base: &str, id: &str) -> anyhow::Result<()> {
    let url = format!("{}/admin/requests/{}/decline", base, id);
    handle_error(client.post(&url).send().await?).await?;
    println!("declined request {}", id);
    Ok(())
}

/// 列出菜品
pub async fn list_foods(client: &Client, base: &str, output: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/foods", base);
    let resp = handle_error(client.get(&url).send().await?).await?;
    let foods: Vec<FoodItem> = resp.json().await?;

    match output {
        OutputFormat::Json => print_json(&foods)?,
        OutputFormat::Table => {
            println!("{:<38} {:<10} {:<12} NAME", "ID", "PRICE", "CATEGORY");
            for food in foods {
                println!(
                    "{:<38} {:<10.2} {:<12} {}{}",
                    food.id,
                    food.price,
                    food.category,
                    food.name,
                    if food.available { "" } else { " (unavailable)" }
                );
            }
        }
    }
    Ok(())
}

/// 列出套餐
pub async fn list_combos(client: &Client, base: &str, output: OutputFormat) -> anyhow::Result<()> {
    let url = format!("{}/combos", base);
    let resp = handle_error(client.get(&url).send().await?).await?;
    let combos: Vec<ComboView> = resp.json().await?;

    match output {
        OutputFormat::Json => print_json(&combos)?,
        OutputFormat::Table => {
            for combo in combos {
                let names: Vec<&str> = combo.items.iter().map(|i| i.name.as_str()).collect();
                println!(
                    "{:<38} {:<10.2} {:?} {} [{}]",
                    combo.id,
                    combo.price,
                    combo.status,
                    combo.name,
                    names.join(", ")
                );
            }
        }
    }
    Ok(())
}
