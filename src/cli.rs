//! Interface de linha de comando do pubhtml baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (convert, tree)
//! e a flag global --verbose.

use clap::{Parser, Subcommand};

/// pubhtml — Conversor em massa de arquivos Publisher (.pub) para HTML.
#[derive(Debug, Parser)]
#[command(name = "pubhtml", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Converte um único arquivo Publisher para HTML.
    Convert {
        /// Caminho do arquivo Publisher a converter.
        pub_file: String,

        /// Diretório onde salvar o HTML.
        #[arg(long, default_value = "output")]
        output_dir: String,

        /// Constante de formato do SaveAs do Publisher (padrão: 7, HTML).
        #[arg(long)]
        format_code: Option<i32>,

        /// Máximo de tentativas após matar o Publisher.
        #[arg(long)]
        max_retries: Option<u32>,
    },

    /// Converte recursivamente todos os arquivos .pub de uma árvore.
    Tree {
        /// Diretório raiz onde procurar arquivos .pub.
        input_root: String,

        /// Diretório raiz onde gravar os arquivos HTML.
        output_root: String,
    },
}
