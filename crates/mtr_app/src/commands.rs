use std::future::Future;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, Utc};
use mtr_core::{authorize, Access, AccessDenied, ConfigBoard, ConfigItem, ConfigKind, Operator};
use mtr_engine::{ApiClient, HistoryPage, NewUser, SessionStore, SessionUser, UserRecord};
use mtr_logging::{mtr_info, mtr_warn};

use crate::cli::{entity_for, ConfigAction, UsersAction};
use crate::settings::AppSettings;

/// Runs one backend call to completion on a throwaway runtime.
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// An unreadable session file is discarded, the same as being logged out.
pub fn current_session(store: &SessionStore) -> Option<SessionUser> {
    match store.load() {
        Ok(user) => user,
        Err(err) => {
            mtr_warn!("Discarding unreadable session {:?}: {}", store.path(), err);
            if let Err(err) = store.clear() {
                mtr_warn!("Could not remove session file: {}", err);
            }
            None
        }
    }
}

pub fn operator_of(user: &SessionUser) -> Operator {
    Operator {
        login: user.login.clone(),
        nome: user.nome.clone(),
        cnp: user.cnp.clone().unwrap_or_default(),
        adm: user.adm,
    }
}

/// Resolves the saved session and checks it against `access`.
pub fn require(store: &SessionStore, access: Access) -> anyhow::Result<(SessionUser, Operator)> {
    let user = current_session(store);
    let operator = user.as_ref().map(operator_of);
    match authorize(operator.as_ref(), access) {
        Ok(_) => {}
        Err(AccessDenied::NotLoggedIn) => {
            bail!("nenhuma sessão ativa; use `mtr_desk login` primeiro")
        }
        Err(err @ AccessDenied::NotAdmin(_)) => bail!("acesso negado: {err}"),
    }
    match (user, operator) {
        (Some(user), Some(operator)) => Ok((user, operator)),
        _ => Err(anyhow!("nenhuma sessão ativa")),
    }
}

pub fn client_for(settings: &AppSettings, user: Option<&SessionUser>) -> anyhow::Result<ApiClient> {
    let client = ApiClient::new(&settings.api_settings())
        .with_context(|| format!("invalid API URL {:?}", settings.api_url))?;
    Ok(client.with_token(user.and_then(|u| u.token.clone())))
}

pub fn login(
    settings: &AppSettings,
    store: &SessionStore,
    login: &str,
    senha: Option<String>,
) -> anyhow::Result<()> {
    let login = login.trim();
    if login.is_empty() {
        bail!("informe o login");
    }
    let senha = match senha {
        Some(senha) => senha,
        None => prompt_password()?,
    };

    let client = client_for(settings, None)?;
    let user = block_on(client.login(login, &senha))??;
    store.save(&user, Utc::now())?;
    mtr_info!("Logged in as {}", user.login);
    println!("Sessão iniciada: {} ({})", display_name(&user), user.login);
    Ok(())
}

fn prompt_password() -> anyhow::Result<String> {
    print!("Senha: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn logout(store: &SessionStore) -> anyhow::Result<()> {
    if store.clear()? {
        println!("Sessão encerrada.");
    } else {
        println!("Nenhuma sessão ativa.");
    }
    Ok(())
}

pub fn whoami(store: &SessionStore) -> anyhow::Result<()> {
    match current_session(store) {
        Some(user) => {
            println!("Login:  {}", user.login);
            println!("Nome:   {}", display_name(&user));
            println!("CNP:    {}", user.cnp.as_deref().unwrap_or("-"));
            println!(
                "Perfil: {}",
                if user.adm { "administrador" } else { "operador" }
            );
        }
        None => println!("Nenhuma sessão ativa."),
    }
    Ok(())
}

fn display_name(user: &SessionUser) -> &str {
    if user.nome.trim().is_empty() {
        &user.login
    } else {
        &user.nome
    }
}

pub fn config(client: &ApiClient, action: ConfigAction) -> anyhow::Result<()> {
    let mut board = ConfigBoard::new();
    let kinds: Vec<ConfigKind> = match &action {
        ConfigAction::List { kind: Some(kind) } => vec![kind.kind()],
        ConfigAction::List { kind: None } => ConfigKind::ALL.to_vec(),
        ConfigAction::Add { kind, .. }
        | ConfigAction::Rename { kind, .. }
        | ConfigAction::Remove { kind, .. } => vec![kind.kind()],
    };

    block_on(async {
        for &kind in &kinds {
            refresh(client, &mut board, kind).await;
        }

        match action {
            ConfigAction::List { .. } => {}
            ConfigAction::Add { kind, name } => {
                let kind = kind.kind();
                let name = ConfigBoard::prepare_name(kind, &name)?;
                match client.save_config(entity_for(kind), None, &name).await {
                    Ok(receipt) => match receipt.id {
                        Some(id) => board.apply_saved(kind, ConfigItem { id, name }),
                        None => refresh(client, &mut board, kind).await,
                    },
                    Err(err) => board.fail(kind, err.message),
                }
            }
            ConfigAction::Rename { kind, id, name } => {
                let kind = kind.kind();
                let name = ConfigBoard::prepare_name(kind, &name)?;
                match client.save_config(entity_for(kind), Some(id), &name).await {
                    Ok(_) => board.apply_saved(kind, ConfigItem { id, name }),
                    Err(err) => board.fail(kind, err.message),
                }
            }
            ConfigAction::Remove { kind, id } => {
                let kind = kind.kind();
                match client.delete_config(entity_for(kind), id).await {
                    Ok(()) => board.apply_deleted(kind, id),
                    Err(err) => board.fail(kind, err.message),
                }
            }
        }
        anyhow::Ok(())
    })??;

    for line in format_board(&board, &kinds) {
        println!("{line}");
    }
    match kinds.iter().find_map(|&kind| board.error(kind)) {
        Some(message) => bail!("{message}"),
        None => Ok(()),
    }
}

async fn refresh(client: &ApiClient, board: &mut ConfigBoard, kind: ConfigKind) {
    match client.list_config(entity_for(kind)).await {
        Ok(entries) => board.load(
            kind,
            entries
                .into_iter()
                .map(|entry| ConfigItem {
                    id: entry.id,
                    name: entry.name,
                })
                .collect(),
        ),
        Err(err) => {
            mtr_warn!("Failed to load {} list: {}", kind, err);
            board.fail(kind, err.message);
        }
    }
}

pub(crate) fn format_board(board: &ConfigBoard, kinds: &[ConfigKind]) -> Vec<String> {
    let mut lines = Vec::new();
    for &kind in kinds {
        lines.push(format!("{kind}:"));
        if let Some(error) = board.error(kind) {
            lines.push(format!("  erro: {error}"));
        }
        let items = board.items(kind);
        if items.is_empty() && board.error(kind).is_none() {
            lines.push("  (vazio)".to_string());
        }
        lines.extend(items.iter().map(|item| format!("  {:>4}  {}", item.id, item.name)));
    }
    lines
}

pub fn users(client: &ApiClient, operator: &Operator, action: UsersAction) -> anyhow::Result<()> {
    match action {
        UsersAction::List => {
            let users = block_on(client.list_users())??;
            for line in format_users(&users) {
                println!("{line}");
            }
        }
        UsersAction::Add {
            nome,
            login,
            senha,
            cnp,
            adm,
        } => {
            let cnp = cnp
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| operator.cnp.clone());
            if nome.trim().is_empty() || login.trim().is_empty() || senha.is_empty() {
                bail!("nome, login e senha são obrigatórios");
            }
            if cnp.trim().is_empty() {
                bail!("informe --cnp: a sessão atual não tem CNP");
            }
            let user = NewUser {
                nome: nome.trim().to_string(),
                login: login.trim().to_string(),
                senha,
                cnp,
                adm,
            };
            let message = block_on(client.create_user(&user))??;
            mtr_info!("Created user {}", user.login);
            println!("{}", message.unwrap_or_else(|| "Usuário criado com sucesso!".to_string()));
        }
        UsersAction::Remove { id } => {
            block_on(client.delete_user(id))??;
            mtr_info!("Deleted user {}", id);
            println!("Usuário {id} excluído.");
        }
    }
    Ok(())
}

pub(crate) fn format_users(users: &[UserRecord]) -> Vec<String> {
    if users.is_empty() {
        return vec!["Nenhum usuário cadastrado.".to_string()];
    }
    users
        .iter()
        .map(|user| {
            format!(
                "{:>4}  {:<16} {:<30} {:<16} {}",
                user.id,
                user.login,
                user.nome.as_deref().unwrap_or("-"),
                user.cnp.as_deref().unwrap_or("-"),
                if user.adm { "adm" } else { "" }
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn history(client: &ApiClient, page: u32, per_page: u32) -> anyhow::Result<()> {
    let page = block_on(client.list_history(page, per_page))??;
    for line in format_history(&page) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn format_history(page: &HistoryPage) -> Vec<String> {
    let mut lines = vec![format!(
        "Baixas: página {} de {} ({} no total)",
        page.page,
        page.total_pages.max(1),
        page.total
    )];
    if page.items.is_empty() {
        lines.push("  Nenhuma baixa registrada.".to_string());
    }
    lines.extend(page.items.iter().map(|item| {
        format!(
            "  {:>5}  MTR {:<10}  {:<16} {}",
            item.id,
            item.mtr.as_deref().unwrap_or("-"),
            item.usuario.as_deref().unwrap_or("-"),
            item.data_baixa.as_deref().map(format_timestamp).unwrap_or_default()
        )
        .trim_end()
        .to_string()
    }));
    lines
}

/// RFC 3339 timestamps are shown in local time; anything else verbatim.
fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtr_engine::HistoryItem;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_session_requires_login() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("session.ron"));
        let err = require(&store, Access::Operator).unwrap_err();
        assert!(err.to_string().contains("mtr_desk login"));
    }

    #[test]
    fn operator_session_cannot_use_admin_commands() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("session.ron"));
        let user = SessionUser {
            login: "operador1".to_string(),
            nome: "Operador".to_string(),
            cnp: None,
            adm: false,
            token: None,
        };
        store.save(&user, Utc::now()).unwrap();

        let (_, operator) = require(&store, Access::Operator).unwrap();
        assert_eq!(operator.cnp, "");
        let err = require(&store, Access::Admin).unwrap_err();
        assert!(err.to_string().starts_with("acesso negado"));
    }

    #[test]
    fn corrupt_session_is_discarded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.ron");
        std::fs::write(&path, "{{ not ron").unwrap();

        assert_eq!(current_session(&SessionStore::new(&path)), None);
        assert!(!path.exists());
    }

    #[test]
    fn board_shows_items_and_errors_per_kind() {
        let mut board = ConfigBoard::new();
        board.load(
            ConfigKind::Sector,
            vec![ConfigItem {
                id: 1,
                name: "Balança".to_string(),
            }],
        );
        board.fail(ConfigKind::Category, "HTTP 500: Internal Server Error");

        assert_eq!(
            format_board(&board, &ConfigKind::ALL),
            vec![
                "setor:".to_string(),
                "     1  Balança".to_string(),
                "pagamento:".to_string(),
                "  (vazio)".to_string(),
                "categoria:".to_string(),
                "  erro: HTTP 500: Internal Server Error".to_string(),
            ]
        );
    }

    #[test]
    fn history_page_lists_entries() {
        let page = HistoryPage {
            page: 1,
            per_page: 10,
            items: vec![HistoryItem {
                id: 7,
                mtr: Some("1234567890".to_string()),
                usuario: Some("operador1".to_string()),
                data_baixa: Some("ontem".to_string()),
            }],
            total: 1,
            total_pages: 1,
        };
        assert_eq!(
            format_history(&page),
            vec![
                "Baixas: página 1 de 1 (1 no total)".to_string(),
                "      7  MTR 1234567890  operador1        ontem".to_string(),
            ]
        );
    }

    #[test]
    fn empty_user_list_says_so() {
        assert_eq!(format_users(&[]), vec!["Nenhum usuário cadastrado.".to_string()]);
    }
}
