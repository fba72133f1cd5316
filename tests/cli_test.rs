mod common;

use anyhow::Result;
use common::{add_expense, test_store};
use fintrack::application::{AppError, LedgerStore};
use fintrack::cli::{execute, Commands, Style};
use fintrack::domain::ParseCentsError;

fn add_command(amount: &str) -> Commands {
    Commands::Add {
        amount: amount.to_string(),
        kind: "expense".to_string(),
        category: "Food".to_string(),
        date: Some("2024-03-10".to_string()),
        description: None,
    }
}

fn export_command(output: &std::path::Path, format: &str) -> Commands {
    Commands::Export {
        output: Some(output.to_path_buf()),
        format: format.to_string(),
        verbatim: false,
    }
}

#[tokio::test]
async fn test_add_records_parsed_amount() -> Result<()> {
    let (store, _temp) = test_store().await?;

    execute(&store, add_command("45.50"), Style::Plain).await?;

    let all = store.list_all().await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].amount_cents, 4550);
    assert_eq!(all[0].category, "Food");
    Ok(())
}

#[tokio::test]
async fn test_add_unparseable_amount_is_invalid_amount() -> Result<()> {
    let (store, _temp) = test_store().await?;

    for text in ["abc", "", "12.34.56", "0", "-5"] {
        let err = execute(&store, add_command(text), Style::Plain)
            .await
            .unwrap_err();
        assert!(
            matches!(err.downcast_ref::<AppError>(), Some(AppError::InvalidAmount(_))),
            "{:?} should be an invalid amount, got {:#}",
            text,
            err
        );
    }

    assert_eq!(store.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_add_sub_cent_amount_is_rejected_as_too_precise() -> Result<()> {
    let (store, _temp) = test_store().await?;

    for text in ["12.345", "0.001"] {
        let err = execute(&store, add_command(text), Style::Plain)
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<ParseCentsError>(),
                Some(ParseCentsError::TooPrecise(_))
            ),
            "{:?} should be too precise, got {:#}",
            text,
            err
        );
        assert!(err.downcast_ref::<AppError>().is_none());
    }

    execute(&store, add_command("12.340"), Style::Plain).await?;
    let all = store.list_all().await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].amount_cents, 1234);
    Ok(())
}

#[tokio::test]
async fn test_commands_on_unavailable_store_report_storage_unavailable() -> Result<()> {
    let store = LedgerStore::unavailable("database is locked");

    for command in [add_command("10"), Commands::Summary, Commands::Delete { id: 1 }] {
        let err = execute(&store, command, Style::Plain).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::StorageUnavailable(_))
        ));
    }
    Ok(())
}

#[tokio::test]
async fn test_unknown_export_format_leaves_file_untouched() -> Result<()> {
    let (store, temp) = test_store().await?;
    add_expense(&store, "2024-01-01", "Food", 100).await?;

    let path = temp.path().join("report.csv");
    std::fs::write(&path, "precious data\n")?;

    let err = execute(&store, export_command(&path, "xml"), Style::Plain)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown export format 'xml'"));
    assert_eq!(std::fs::read_to_string(&path)?, "precious data\n");
    Ok(())
}

#[tokio::test]
async fn test_export_on_unavailable_store_leaves_file_untouched() -> Result<()> {
    let (_, temp) = test_store().await?;
    let path = temp.path().join("report.csv");
    std::fs::write(&path, "precious data\n")?;

    let store = LedgerStore::unavailable("database is locked");
    let err = execute(&store, export_command(&path, "csv"), Style::Plain)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::StorageUnavailable(_))
    ));
    assert_eq!(std::fs::read_to_string(&path)?, "precious data\n");
    Ok(())
}

#[tokio::test]
async fn test_export_command_writes_json_file() -> Result<()> {
    let (store, temp) = test_store().await?;
    add_expense(&store, "2024-01-01", "Food", 100).await?;

    let path = temp.path().join("ledger.json");
    execute(&store, export_command(&path, "json"), Style::Plain).await?;

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(value["transactions"].as_array().map(Vec::len), Some(1));
    Ok(())
}
