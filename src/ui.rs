//! Interface de terminal do pubhtml — progresso e saída colorida.
//!
//! Usa as crates `indicatif` para barras/spinners de progresso e `console`
//! para estilização com cores. O [`ConvertProgress`] acompanha uma conversão
//! avulsa; o [`WalkProgress`] acompanha a caminhada de árvore com ETA.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::job::{ConversionRecord, ConversionStatus, WalkSummary};

/// Formata segundos como `HH:MM:SS`, o formato dos relatórios de progresso.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Indicador visual para a conversão de um único documento.
pub struct ConvertProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl ConvertProgress {
    /// Inicia o spinner com o nome do documento sendo convertido.
    pub fn start(description: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("Converting {description}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Finaliza o spinner com o resultado da conversão.
    pub fn complete(&self, record: &ConversionRecord) {
        self.pb.finish_and_clear();
        match record.status {
            ConversionStatus::Converted => println!(
                "  {} Converted to: {}",
                self.green.apply_to("✓"),
                record.output_html.display()
            ),
            ConversionStatus::SkippedExisting => println!(
                "  {} Already converted: {}",
                self.green.apply_to("✓"),
                record.output_html.display()
            ),
        }
    }

    /// Finaliza o spinner com uma falha terminal.
    pub fn fail(&self, error: &dyn std::fmt::Display) {
        self.pb.finish_and_clear();
        eprintln!("  {} {error}", self.red.apply_to("✗"));
    }

    /// Imprime o registro de conversão formatado em JSON (modo verboso).
    pub fn print_record(&self, record: &ConversionRecord) {
        println!();
        println!("{}", self.green.apply_to("─── Conversion Record ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_default()
        );
    }
}

/// Indicador visual para a caminhada de árvore: barra de progresso com
/// contagem de arquivos, tempo decorrido e estimativa de tempo restante.
pub struct WalkProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl WalkProgress {
    pub fn start(total_files: u64) -> Self {
        let pb = ProgressBar::new(total_files);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .expect("invalid template"),
        );

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Reporta o início da conversão de um arquivo, com tempos formatados.
    pub fn converting(
        &self,
        processed: u64,
        total: u64,
        source: &std::path::Path,
        elapsed_secs: u64,
        eta_secs: u64,
    ) {
        self.pb.println(format!(
            "Converting file {processed} of {total}: {}",
            source.display()
        ));
        self.pb.println(format!(
            "Time elapsed: {}, estimated time remaining: {}",
            format_hms(elapsed_secs),
            format_hms(eta_secs)
        ));
        self.pb.set_position(processed);
    }

    /// Reporta um arquivo pulado por já estar convertido.
    pub fn skipped(&self, skipped_so_far: u32, source: &std::path::Path) {
        self.pb.println(format!(
            "  {} Skipping already converted file ({skipped_so_far} skipped): {}",
            self.yellow.apply_to("→"),
            source.display()
        ));
        self.pb.inc(1);
    }

    /// Reporta um erro de conversão — a caminhada continua.
    pub fn file_error(&self, source: &std::path::Path, error: &dyn std::fmt::Display) {
        self.pb.println(format!(
            "  {} Error converting {}: {error}",
            self.red.apply_to("✗"),
            source.display()
        ));
    }

    /// Finaliza a barra e imprime o resumo da caminhada.
    pub fn finish(&self, total: u64, summary: &WalkSummary, elapsed_secs: u64) {
        self.pb.finish_and_clear();
        println!();
        println!("{}", self.green.apply_to("Conversion complete:"));
        println!("Total files: {total}");
        println!("Converted: {}", summary.converted);
        println!("Skipped: {}", summary.skipped);
        println!("Total time: {}", format_hms(elapsed_secs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formats_zero() {
        assert_eq!(format_hms(0), "00:00:00");
    }

    #[test]
    fn hms_formats_minutes_and_seconds() {
        assert_eq!(format_hms(61), "00:01:01");
        assert_eq!(format_hms(3599), "00:59:59");
    }

    #[test]
    fn hms_formats_hours() {
        assert_eq!(format_hms(3600), "01:00:00");
        assert_eq!(format_hms(7325), "02:02:05");
    }
}
