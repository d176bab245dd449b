use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mtr_core::ConfigKind;
use mtr_engine::ConfigEntity;

#[derive(Debug, Parser)]
#[command(
    name = "mtr_desk",
    version,
    about = "MTR Desk: consulta, validação e baixa de Manifestos de Transporte de Resíduos"
)]
pub struct Cli {
    /// Arquivo RON de configuração (padrão: ./mtr_desk.ron, se existir)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// URL base da API do backend
    #[arg(long, env = "MTR_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Arquivo onde a sessão do operador é guardada
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Também grava o log neste arquivo
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Aumenta o nível de log (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inicia a sessão do operador
    Login {
        #[arg(long)]
        login: String,
        /// Senha; se omitida é lida da entrada padrão
        #[arg(long, env = "MTR_SENHA", hide_env_values = true)]
        senha: Option<String>,
    },
    /// Encerra a sessão salva
    Logout,
    /// Mostra o operador da sessão atual
    Whoami,
    /// Consulta interativa: um código de MTR por linha, comandos com ':'
    Scan {
        /// Diretório dos relatórios gerados com :relatorio
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Consulta os códigos informados, em ordem, e imprime a tabela final
    Lookup {
        #[arg(required = true)]
        codes: Vec<String>,
        /// Gera o relatório dos MTRs válidos ao final
        #[arg(long)]
        report: bool,
        /// Registra a baixa dos MTRs válidos ao final
        #[arg(long)]
        baixa: bool,
    },
    /// Cadastros de setor, tipo de pagamento e categoria
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Gestão de usuários (somente administradores)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Histórico paginado de baixas (somente administradores)
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = mtr_engine::DEFAULT_PER_PAGE)]
        per_page: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Lista um cadastro, ou todos
    List { kind: Option<KindArg> },
    Add { kind: KindArg, name: String },
    Rename { kind: KindArg, id: u64, name: String },
    #[command(alias = "rm")]
    Remove { kind: KindArg, id: u64 },
}

#[derive(Debug, Subcommand)]
pub enum UsersAction {
    List,
    Add {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        login: String,
        #[arg(long, env = "MTR_NOVA_SENHA", hide_env_values = true)]
        senha: String,
        /// CNPJ/CPF da unidade; padrão: o do operador logado
        #[arg(long)]
        cnp: Option<String>,
        #[arg(long)]
        adm: bool,
    },
    #[command(alias = "rm")]
    Remove { id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Setor,
    Pagamento,
    Categoria,
}

impl KindArg {
    pub fn kind(self) -> ConfigKind {
        match self {
            KindArg::Setor => ConfigKind::Sector,
            KindArg::Pagamento => ConfigKind::PaymentType,
            KindArg::Categoria => ConfigKind::Category,
        }
    }
}

pub fn entity_for(kind: ConfigKind) -> ConfigEntity {
    match kind {
        ConfigKind::Sector => ConfigEntity::Sector,
        ConfigKind::PaymentType => ConfigEntity::PaymentType,
        ConfigKind::Category => ConfigEntity::Category,
    }
}
