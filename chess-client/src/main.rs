use std::io::BufRead;

use anyhow::Result;
use chess_client::board::render_view;
use chess_client::game::{
    parse_command, parse_menu_choice, Command, GameEvent, MenuChoice, Session, HELP, MENU_PROMPT,
};
use chess_client::network::{join, JoinOutcome, TcpPeerChannel};
use chess_client::settings::network_config;
use protocol::{GameResult, Side};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 标准输入行队列长度
const INPUT_QUEUE_SIZE: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（写到 stderr，不干扰棋盘输出）
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("chess_client=debug".parse()?))
        .init();

    let config = network_config(std::env::args().nth(1).as_deref())?;
    let addr = config.addr();
    info!("国际象棋客户端启动，中继地址: {}", addr);

    // 标准输入在独立线程中阻塞读取，整个进程只有一个读取者
    let mut lines = spawn_stdin_reader();

    loop {
        match join_game(&addr).await {
            Some((side, channel)) => match play(side, channel, &mut lines).await {
                Ok(result) => {
                    if let Some(code) = result.code() {
                        println!("Result code: {}", code);
                    }
                }
                Err(e) => warn!("Game aborted: {:#}", e),
            },
            None => println!("Could not join the relay at {}", addr),
        }

        if !ask_again(&mut lines).await {
            break;
        }
    }

    info!("客户端退出");
    Ok(())
}

/// 连接中继并等待配对，任一步失败都返回 None
async fn join_game(addr: &str) -> Option<(Side, TcpPeerChannel)> {
    let JoinOutcome::Joined(channel) = join(addr).await else {
        return None;
    };

    println!("Waiting for an opponent...");
    match channel.pair().await {
        JoinOutcome::Joined(paired) => Some(paired),
        JoinOutcome::CouldNotJoin => None,
    }
}

/// 进行一局，直到出现结果
async fn play(
    side: Side,
    channel: TcpPeerChannel,
    lines: &mut mpsc::Receiver<String>,
) -> Result<GameResult> {
    let (source, sink) = channel.into_parts();
    let session = Session::start(side, source, sink);

    let mut view = session.view();
    println!("{}", HELP);
    println!("{}", render_view(&view.borrow_and_update()));

    let mut input_open = true;
    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                println!("{}", render_view(&snapshot));
                if snapshot.result.is_over() {
                    break;
                }
            }
            line = lines.recv(), if input_open => match line {
                Some(line) => handle_line(&session, &line).await,
                None => {
                    info!("Input closed, resigning");
                    input_open = false;
                    session.send(GameEvent::Resign).await;
                }
            },
        }
    }

    session.finish().await
}

async fn handle_line(session: &Session, line: &str) {
    match parse_command(line) {
        Ok(Command::Events(batch)) => {
            for event in batch {
                if !session.send(event).await {
                    return;
                }
            }
        }
        Ok(Command::Help) => println!("{}", HELP),
        Err(e) => {
            warn!("Bad input: {}", e);
            println!("{}", HELP);
        }
    }
}

/// 回到菜单：重试返回 true，退出或输入关闭返回 false
async fn ask_again(lines: &mut mpsc::Receiver<String>) -> bool {
    loop {
        println!("{}", MENU_PROMPT);
        let Some(line) = lines.recv().await else {
            return false;
        };

        match parse_menu_choice(&line) {
            Some(MenuChoice::Retry) => return true,
            Some(MenuChoice::Quit) => return false,
            None => {}
        }
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_QUEUE_SIZE);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
