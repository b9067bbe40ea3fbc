//! Controle de processos externos via sysinfo para recuperação entre tentativas.
//!
//! O [`ProcessControl`] abstrai a terminação por nome de instâncias penduradas
//! do Publisher, permitindo que os testes simulem processos vivos/mortos sem
//! tocar em processos reais.

use sysinfo::System;

/// Colaborador de recuperação: enumeração e terminação de processos por nome.
///
/// A correspondência de nome é por substring, sem diferenciar maiúsculas,
/// espelhando a forma como o Publisher aparece na tabela de processos
/// (`MSPUB.EXE`, às vezes com caminho).
pub trait ProcessControl {
    /// Há alguma instância viva cujo nome corresponde ao matcher?
    fn is_any_running(&self, matcher: &str) -> bool;

    /// Mata todas as instâncias correspondentes. Retorna `true` se pelo menos
    /// um sinal de terminação foi enviado. Melhor esforço: não espera nem
    /// verifica a morte — isso fica a cargo do supervisor.
    fn terminate_all(&self, matcher: &str) -> bool;
}

/// Implementação real sobre a tabela de processos do sistema.
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn is_any_running(&self, matcher: &str) -> bool {
        let mut sys = System::new();
        sys.refresh_processes();
        sys.processes()
            .values()
            .any(|p| name_matches(p.name(), matcher))
    }

    fn terminate_all(&self, matcher: &str) -> bool {
        let mut sys = System::new();
        sys.refresh_processes();
        let mut killed = false;
        for process in sys.processes().values() {
            if name_matches(process.name(), matcher) {
                killed |= process.kill();
            }
        }
        killed
    }
}

/// Correspondência por substring, sem diferenciar maiúsculas/minúsculas.
fn name_matches(process_name: &str, matcher: &str) -> bool {
    process_name
        .to_uppercase()
        .contains(&matcher.to_uppercase())
}
