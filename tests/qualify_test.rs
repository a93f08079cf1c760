use anyhow::Result;
use cart_recovery::app::QualifyUseCase;
use cart_recovery::config::Config;
use cart_recovery::error::LeadError;
use cart_recovery::export::export_csv;
use cart_recovery::ingest::{load_path, TableFormat};
use cart_recovery::payload::build_payload;
use cart_recovery::table::Cell;
use std::fs;
use tempfile::tempdir;

const REPORT: &str = "\
Codigo Cliente,Cliente,Fone Fixo,Quant. Pedidos Enviados,Status,N. Pedido,Valor Total
1,Ana Souza,(11) 98888-7777,0,Pedido Salvo,5001,150.00
1,Ana Souza,(11) 98888-7777,0,Pedido Salvo,5002,80.00
2,Bruno Lima,(21) 3333-4444,2,Pedido Salvo,5003,99.90
3,Carla Dias,(31) 97777-6666,0,Outro,5004,45.00
";

#[test]
fn end_to_end_scenario_keeps_only_first_new_customer() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("relatorio.csv");
    fs::write(&path, REPORT)?;

    let outcome = QualifyUseCase::from_config(Config::default()).run_path(&path)?;

    assert_eq!(outcome.summary.total_rows, 4);
    assert_eq!(outcome.summary.qualified_rows, 1);
    let id = outcome.qualified.column_index("Codigo Cliente").unwrap();
    let order = outcome.qualified.column_index("N. Pedido").unwrap();
    assert_eq!(outcome.qualified.cell(0, id), Some(&Cell::Int(1)));
    assert_eq!(outcome.qualified.cell(0, order), Some(&Cell::Int(5001)));
    Ok(())
}

#[test]
fn integral_and_decimal_ids_in_csv_are_one_customer() -> Result<()> {
    let report = "\
Codigo Cliente,Cliente,Fone Fixo,Quant. Pedidos Enviados,Status,N. Pedido,Valor Total
42,Ana Souza,(11) 98888-7777,0,Pedido Salvo,5001,150.00
42.0,Ana Souza,(11) 98888-7777,0,Pedido Salvo,5002,80.00
";
    let outcome = QualifyUseCase::from_config(Config::default())
        .run_bytes(report.as_bytes(), TableFormat::Csv)?;
    assert_eq!(outcome.summary.qualified_rows, 1);

    let items = build_payload(&outcome.qualified, &Config::default().payload)?;
    assert_eq!(items[0]["N. Pedido"], 5001);
    assert_eq!(items[0]["Valor Total"], 150.0);
    let keys: Vec<&str> = items[0].keys().map(String::as_str).collect();
    assert_eq!(keys[..3], ["Codigo Cliente", "Cliente", "Fone Fixo"]);
    Ok(())
}

#[test]
fn qualified_rows_satisfy_the_rule_and_have_unique_ids() -> Result<()> {
    let mut report = String::from(
        "Codigo Cliente,Cliente,Fone Fixo,Quant. Pedidos Enviados,Status,N. Pedido,Valor Total\n",
    );
    let statuses = ["Pedido Salvo", "Outro", "Pedido Salvo", "Faturado"];
    let counts = ["0", "1", "x", "0", "0.0", ""];
    for i in 0..48 {
        report.push_str(&format!(
            "{},Cliente {},1199999{:04},{},{},{},10\n",
            i % 7,
            i,
            i,
            counts[i % counts.len()],
            statuses[i % statuses.len()],
            9000 + i
        ));
    }

    let table = cart_recovery::ingest::load_bytes(
        report.as_bytes(),
        TableFormat::Csv,
        &Config::default().input,
    )?;
    let outcome = QualifyUseCase::from_config(Config::default()).run_table(&table)?;
    let q = &outcome.qualified;

    let id = q.column_index("Codigo Cliente").unwrap();
    let status = q.column_index("Status").unwrap();
    let sent = q.column_index("Quant. Pedidos Enviados").unwrap();
    let mut seen = std::collections::HashSet::new();
    for row in q.rows() {
        assert_eq!(row[status], Cell::Text("Pedido Salvo".into()));
        assert_eq!(row[sent], Cell::Float(0.0));
        assert!(seen.insert(row[id].dedup_key()), "duplicate id in qualified set");
    }
    assert!(!q.is_empty());
    assert!(q.len() <= table.len());
    Ok(())
}

#[test]
fn missing_columns_are_all_named() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("incompleto.csv");
    fs::write(&path, "Cliente,Status,Valor Total\nAna,Pedido Salvo,10\n")?;

    match QualifyUseCase::from_config(Config::default()).run_path(&path) {
        Err(LeadError::MissingColumns { missing }) => {
            assert_eq!(
                missing,
                vec!["Codigo Cliente", "Fone Fixo", "Quant. Pedidos Enviados", "N. Pedido"]
            );
        }
        other => panic!("expected MissingColumns, got {:?}", other.map(|o| o.summary)),
    }
    Ok(())
}

#[test]
fn padded_headers_validate_when_trimming_is_enabled() -> Result<()> {
    let padded = REPORT.replacen("Status", " Status ", 1);
    let dir = tempdir()?;
    let path = dir.path().join("padded.csv");
    fs::write(&path, padded)?;

    let strict = QualifyUseCase::from_config(Config::default()).run_path(&path);
    assert!(matches!(strict, Err(LeadError::MissingColumns { .. })));

    let mut config = Config::default();
    config.input.trim_headers = true;
    let outcome = QualifyUseCase::from_config(config).run_path(&path)?;
    assert_eq!(outcome.summary.qualified_rows, 1);
    Ok(())
}

#[test]
fn export_writes_qualified_rows_back_as_csv() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("relatorio.csv");
    let output = dir.path().join("leads.csv");
    fs::write(&input, REPORT)?;

    let outcome = QualifyUseCase::from_config(Config::default()).run_path(&input)?;
    export_csv(&outcome.qualified, &output)?;

    let exported = load_path(&output, &Config::default().input)?;
    assert_eq!(exported.headers(), outcome.qualified.headers());
    assert_eq!(exported.len(), 1);
    let phone = exported.column_index("Fone Fixo").unwrap();
    // digits-only phones read back as numbers
    assert_eq!(exported.cell(0, phone), Some(&Cell::Int(5511988887777)));
    Ok(())
}

#[test]
fn unsupported_and_corrupt_files_are_malformed_input() -> Result<()> {
    let dir = tempdir()?;
    let pdf = dir.path().join("relatorio.pdf");
    fs::write(&pdf, b"%PDF-1.4")?;
    let xlsx = dir.path().join("relatorio.xlsx");
    fs::write(&xlsx, b"definitely not a zip archive")?;

    let use_case = QualifyUseCase::from_config(Config::default());
    assert!(matches!(use_case.run_path(&pdf), Err(LeadError::MalformedInput(_))));
    assert!(matches!(use_case.run_path(&xlsx), Err(LeadError::MalformedInput(_))));
    Ok(())
}
